//! A single size class of the slotted store.

use crate::StoreError;
use std::{
    collections::BTreeSet,
    fs::{File, OpenOptions},
    io::{BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};
use tracing::{error, warn};

/// Size of the big-endian length prefix at the start of every slot.
pub const SLOT_HEADER_SIZE: usize = 4;

/// A file of fixed-size slots.
///
/// Every slot starts with a [`SLOT_HEADER_SIZE`] byte big-endian payload length, followed by the
/// payload and zero padding up to the slot size. A zero length marks a free slot.
#[derive(Debug)]
pub(crate) struct Shelf {
    slot_size: u32,
    path: PathBuf,
    file: File,
    /// Number of slots in the file, free ones included.
    slots: u64,
    /// Free slots below `slots`, reused lowest first.
    gaps: BTreeSet<u64>,
}

impl Shelf {
    /// Returns the file name of the shelf holding slots of the given size.
    pub(crate) fn file_name(slot_size: u32) -> String {
        format!("shelf-{slot_size:08}.dat")
    }

    /// Opens (or creates) the shelf file and replays every live slot through `on_record`.
    pub(crate) fn open<F>(dir: &Path, slot_size: u32, mut on_record: F) -> Result<Self, StoreError>
    where
        F: FnMut(u64, &[u8]),
    {
        let path = dir.join(Self::file_name(slot_size));
        let file =
            OpenOptions::new().read(true).write(true).create(true).truncate(false).open(&path)?;

        let len = file.metadata()?.len();
        let slots = len / slot_size as u64;
        if len % slot_size as u64 != 0 {
            warn!(
                target: "blobpool::slotted",
                path = %path.display(),
                len,
                slot_size,
                "Truncating partially written trailing slot"
            );
            file.set_len(slots * slot_size as u64)?;
        }

        let mut shelf = Self { slot_size, path, file, slots, gaps: BTreeSet::new() };
        let capacity = shelf.capacity();

        let mut corrupt = Vec::new();
        {
            let mut reader = BufReader::new(&shelf.file);
            reader.seek(SeekFrom::Start(0))?;

            let mut buf = vec![0u8; slot_size as usize];
            for slot in 0..shelf.slots {
                reader.read_exact(&mut buf)?;

                let size = read_header(&buf);
                if size == 0 {
                    shelf.gaps.insert(slot);
                    continue;
                }
                if size as usize > capacity {
                    error!(
                        target: "blobpool::slotted",
                        path = %shelf.path.display(),
                        slot,
                        size,
                        capacity,
                        "Dropping slot with corrupt length header"
                    );
                    corrupt.push(slot);
                    continue;
                }
                on_record(slot, &buf[SLOT_HEADER_SIZE..SLOT_HEADER_SIZE + size as usize]);
            }
        }
        for slot in corrupt {
            shelf.write_header(slot, 0)?;
            shelf.gaps.insert(slot);
        }
        shelf.trim_tail()?;

        Ok(shelf)
    }

    /// Returns the size of every slot on this shelf, header included.
    pub(crate) const fn slot_size(&self) -> u32 {
        self.slot_size
    }

    /// Returns the largest payload a slot on this shelf can hold.
    pub(crate) const fn capacity(&self) -> usize {
        self.slot_size as usize - SLOT_HEADER_SIZE
    }

    /// Writes `data` into the lowest free slot, appending a new slot if there is none.
    pub(crate) fn insert(&mut self, data: &[u8]) -> Result<u64, StoreError> {
        debug_assert!(!data.is_empty() && data.len() <= self.capacity());

        let (slot, reused) = match self.gaps.pop_first() {
            Some(slot) => (slot, true),
            None if self.slots > u32::MAX as u64 => {
                return Err(StoreError::ShelfFull(self.slot_size));
            }
            None => {
                self.slots += 1;
                (self.slots - 1, false)
            }
        };

        let mut buf = vec![0u8; self.slot_size as usize];
        buf[..SLOT_HEADER_SIZE].copy_from_slice(&(data.len() as u32).to_be_bytes());
        buf[SLOT_HEADER_SIZE..SLOT_HEADER_SIZE + data.len()].copy_from_slice(data);

        if let Err(err) = self.write_at(slot, &buf) {
            if reused {
                self.gaps.insert(slot);
            } else {
                self.slots -= 1;
                // Best effort: a stale partial slot is truncated again on the next open.
                let _ = self.file.set_len(self.slots * self.slot_size as u64);
            }
            return Err(err);
        }
        Ok(slot)
    }

    /// Reads the payload stored in `slot`. `id` is only used for error reporting.
    pub(crate) fn read(&self, id: u64, slot: u64) -> Result<Vec<u8>, StoreError> {
        if slot >= self.slots {
            return Err(StoreError::SlotOutOfBounds(id));
        }
        if self.gaps.contains(&slot) {
            return Err(StoreError::EmptySlot(id));
        }

        let mut file = &self.file;
        file.seek(SeekFrom::Start(self.offset(slot)))?;

        let mut header = [0u8; SLOT_HEADER_SIZE];
        file.read_exact(&mut header)?;
        let size = read_header(&header) as usize;
        if size == 0 {
            return Err(StoreError::EmptySlot(id));
        }
        if size > self.capacity() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("slot {slot} header claims {size} bytes, capacity is {}", self.capacity()),
            )
            .into());
        }

        let mut data = vec![0u8; size];
        file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Frees `slot`. `id` is only used for error reporting.
    pub(crate) fn delete(&mut self, id: u64, slot: u64) -> Result<(), StoreError> {
        if slot >= self.slots {
            return Err(StoreError::SlotOutOfBounds(id));
        }
        if self.gaps.contains(&slot) {
            return Err(StoreError::EmptySlot(id));
        }
        self.write_header(slot, 0)?;
        self.gaps.insert(slot);
        self.trim_tail()
    }

    /// Flushes the shelf file to disk.
    pub(crate) fn sync(&self) -> Result<(), StoreError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Drops free slots from the end of the file.
    fn trim_tail(&mut self) -> Result<(), StoreError> {
        let before = self.slots;
        while self.slots > 0 && self.gaps.remove(&(self.slots - 1)) {
            self.slots -= 1;
        }
        if self.slots != before {
            self.file.set_len(self.slots * self.slot_size as u64)?;
        }
        Ok(())
    }

    fn write_header(&mut self, slot: u64, size: u32) -> Result<(), StoreError> {
        self.write_at(slot, &size.to_be_bytes())
    }

    fn write_at(&mut self, slot: u64, buf: &[u8]) -> Result<(), StoreError> {
        self.file.seek(SeekFrom::Start(self.offset(slot)))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    const fn offset(&self, slot: u64) -> u64 {
        slot * self.slot_size as u64
    }
}

fn read_header(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}
