use crate::StoreError;
use std::fmt::Debug;

/// Provides an interface for a persistent allocator of opaque byte records.
///
/// Records are addressed by the numeric identifier handed out by [`SlotStore::put`]. The
/// identifier is only meaningful to the store that produced it and stays valid until the record
/// is deleted.
///
/// Implementations replay their live records when they are opened (see
/// [`Database::open`](crate::Database::open)); the replay is not part of this trait since every
/// backend has its own way of being constructed.
///
/// Implementations are not expected to be thread-safe. Callers serialize access.
pub trait SlotStore: Debug {
    /// Stores a new record and returns the identifier of the slot holding it.
    ///
    /// # Returns
    /// * `Ok(u64)` the slot identifier of the stored record.
    /// * `Err(StoreError)` if the record is empty, too large, or cannot be written.
    fn put(&mut self, data: &[u8]) -> Result<u64, StoreError>;

    /// Retrieves the record stored under the given slot identifier.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` the stored record bytes.
    /// * `Err(StoreError)` if the slot is unknown, free, or cannot be read.
    fn get(&self, id: u64) -> Result<Vec<u8>, StoreError>;

    /// Deletes the record stored under the given slot identifier, freeing the slot.
    ///
    /// # Returns
    /// * `Ok(())` if the record was deleted.
    /// * `Err(StoreError)` if the slot is unknown, already free, or cannot be written.
    fn delete(&mut self, id: u64) -> Result<(), StoreError>;

    /// Flushes all pending writes and releases the store.
    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}
