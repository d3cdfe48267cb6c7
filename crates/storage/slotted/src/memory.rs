//! In-memory [`SlotStore`] for tests.

use crate::{SlotStore, StoreError};
use std::{cell::Cell, collections::BTreeMap};

/// Operations of a [`MemoryStore`] that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    /// Fail [`SlotStore::put`].
    Put,
    /// Fail [`SlotStore::get`].
    Get,
    /// Fail [`SlotStore::delete`].
    Delete,
}

/// A [`SlotStore`] keeping its records in memory.
///
/// Ids are handed out sequentially and never reused. Every operation can be made to fail a set
/// number of times with [`MemoryStore::fail_next`], which makes the error paths of store users
/// testable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<u64, Vec<u8>>,
    next_id: u64,
    put_failures: Cell<usize>,
    get_failures: Cell<usize>,
    delete_failures: Cell<usize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with raw records, as if they had been found on disk.
    pub fn with_records(records: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut store = Self::new();
        for data in records {
            store.records.insert(store.next_id, data);
            store.next_id += 1;
        }
        store
    }

    /// Returns every stored record in id order, mirroring a replay on open.
    pub fn replay(&self) -> Vec<(u64, Vec<u8>)> {
        self.records.iter().map(|(id, data)| (*id, data.clone())).collect()
    }

    /// Makes the next `times` calls of `op` fail with an I/O error.
    pub fn fail_next(&mut self, op: FailOn, times: usize) {
        let counter = self.failures(op);
        counter.set(counter.get() + times);
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if a record is stored under `id`.
    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    const fn failures(&self, op: FailOn) -> &Cell<usize> {
        match op {
            FailOn::Put => &self.put_failures,
            FailOn::Get => &self.get_failures,
            FailOn::Delete => &self.delete_failures,
        }
    }

    fn check(&self, op: FailOn) -> Result<(), StoreError> {
        let counter = self.failures(op);
        if counter.get() == 0 {
            return Ok(());
        }
        counter.set(counter.get() - 1);
        Err(std::io::Error::other(format!("injected {op:?} failure")).into())
    }
}

impl SlotStore for MemoryStore {
    fn put(&mut self, data: &[u8]) -> Result<u64, StoreError> {
        self.check(FailOn::Put)?;
        if data.is_empty() {
            return Err(StoreError::EmptyRecord);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, data.to_vec());
        Ok(id)
    }

    fn get(&self, id: u64) -> Result<Vec<u8>, StoreError> {
        self.check(FailOn::Get)?;
        self.records.get(&id).cloned().ok_or(StoreError::EmptySlot(id))
    }

    fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        self.check(FailOn::Delete)?;
        self.records.remove(&id).map(|_| ()).ok_or(StoreError::EmptySlot(id))
    }

    fn close(self) -> Result<(), StoreError> {
        Ok(())
    }
}
