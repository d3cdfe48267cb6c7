use thiserror::Error;

/// Errors that may occur while interacting with a slotted store.
///
/// This enum is shared by every [`SlotStore`](crate::SlotStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Represents an I/O error raised by the underlying shelf files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store was configured without any slot size classes.
    #[error("no slot sizes configured")]
    NoShelves,

    /// A configured slot size cannot hold the slot header and at least one byte.
    #[error("slot size {0} too small")]
    SlotSizeTooSmall(u32),

    /// Slot sizes must be strictly increasing.
    #[error("slot sizes not strictly increasing: {previous} followed by {next}")]
    UnorderedSlotSizes {
        /// The preceding slot size.
        previous: u32,
        /// The offending slot size.
        next: u32,
    },

    /// Empty records are indistinguishable from free slots and cannot be stored.
    #[error("cannot store an empty record")]
    EmptyRecord,

    /// The record does not fit into the largest configured shelf.
    #[error("record of {size} bytes exceeds the largest slot capacity of {max} bytes")]
    RecordTooLarge {
        /// The size of the rejected record.
        size: usize,
        /// The largest payload a slot can hold.
        max: usize,
    },

    /// The identifier refers to a shelf that does not exist.
    #[error("unknown shelf for slot id {0:#x}")]
    UnknownShelf(u64),

    /// The identifier points past the end of its shelf.
    #[error("slot id {0:#x} out of bounds")]
    SlotOutOfBounds(u64),

    /// The identifier points at a free slot.
    #[error("slot id {0:#x} is empty")]
    EmptySlot(u64),

    /// The shelf has run out of addressable slot indices.
    #[error("shelf with slot size {0} is full")]
    ShelfFull(u32),
}

impl PartialEq for StoreError {
    fn eq(&self, other: &Self) -> bool {
        use StoreError::*;
        match (self, other) {
            (Io(a), Io(b)) => a.kind() == b.kind(),
            (NoShelves, NoShelves) | (EmptyRecord, EmptyRecord) => true,
            (SlotSizeTooSmall(a), SlotSizeTooSmall(b)) | (ShelfFull(a), ShelfFull(b)) => a == b,
            (
                UnorderedSlotSizes { previous: a, next: b },
                UnorderedSlotSizes { previous: c, next: d },
            ) => a == c && b == d,
            (RecordTooLarge { size: a, max: b }, RecordTooLarge { size: c, max: d }) => {
                a == c && b == d
            }
            (UnknownShelf(a), UnknownShelf(b)) |
            (SlotOutOfBounds(a), SlotOutOfBounds(b)) |
            (EmptySlot(a), EmptySlot(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for StoreError {}
