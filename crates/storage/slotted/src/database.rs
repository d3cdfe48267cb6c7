//! File-backed [`SlotStore`] implementation.

use crate::{SLOT_HEADER_SIZE, SlotStore, StoreError, shelf::Shelf};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Number of low bits of a slot id that address the slot within its shelf.
const SHELF_SHIFT: u32 = 32;

/// Options for opening a [`Database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Directory holding the shelf files. Created if missing.
    pub path: PathBuf,
}

impl Options {
    /// Creates new [`Options`] for a store rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// A persistent store of variable-length records spread over fixed-size slots.
///
/// The store keeps one [shelf](Shelf::file_name) file per configured slot size. Records are
/// placed on the smallest shelf that fits them, so the slot sizes only influence the on-disk
/// layout and never the stored content.
///
/// Slot ids encode the shelf in the high 32 bits and the slot index in the low 32 bits.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    shelves: Vec<Shelf>,
}

impl Database {
    /// Opens (or creates) a store, replaying every live record.
    ///
    /// `on_record` is called with `(id, size, data)` once for every record found on disk,
    /// synchronously and before this method returns. The store itself is not reachable from the
    /// callback, so records can be collected but not modified while replaying.
    ///
    /// # Arguments
    /// * `options` - Where the store lives.
    /// * `slot_sizes` - Strictly increasing slot sizes, header included.
    /// * `on_record` - Replay callback.
    pub fn open<I, F>(options: &Options, slot_sizes: I, mut on_record: F) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = u32>,
        F: FnMut(u64, u32, &[u8]),
    {
        let slot_sizes = validate_slot_sizes(slot_sizes)?;
        std::fs::create_dir_all(&options.path)?;

        let mut replayed = 0usize;
        let mut shelves = Vec::with_capacity(slot_sizes.len());
        for (index, slot_size) in slot_sizes.into_iter().enumerate() {
            let shelf = Shelf::open(&options.path, slot_size, |slot, data| {
                replayed += 1;
                on_record(Self::id(index, slot), data.len() as u32, data);
            })?;
            shelves.push(shelf);
        }

        debug!(
            target: "blobpool::slotted",
            path = %options.path.display(),
            shelves = shelves.len(),
            replayed,
            "Opened slotted store"
        );
        Ok(Self { path: options.path.clone(), shelves })
    }

    /// Returns the directory holding the shelf files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configured slot sizes in ascending order.
    pub fn slot_sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.shelves.iter().map(Shelf::slot_size)
    }

    /// Returns the path of the shelf file for `slot_size` inside `dir`.
    pub fn shelf_path(dir: &Path, slot_size: u32) -> PathBuf {
        dir.join(Shelf::file_name(slot_size))
    }

    /// Returns the largest record the store accepts.
    pub fn max_record_size(&self) -> usize {
        self.shelves.last().map(Shelf::capacity).unwrap_or_default()
    }

    const fn id(shelf: usize, slot: u64) -> u64 {
        ((shelf as u64) << SHELF_SHIFT) | slot
    }

    const fn split(id: u64) -> (usize, u64) {
        ((id >> SHELF_SHIFT) as usize, id & ((1 << SHELF_SHIFT) - 1))
    }

    fn shelf(&self, id: u64) -> Result<(&Shelf, u64), StoreError> {
        let (index, slot) = Self::split(id);
        self.shelves.get(index).map(|shelf| (shelf, slot)).ok_or(StoreError::UnknownShelf(id))
    }
}

impl SlotStore for Database {
    fn put(&mut self, data: &[u8]) -> Result<u64, StoreError> {
        if data.is_empty() {
            return Err(StoreError::EmptyRecord);
        }
        let index = self
            .shelves
            .iter()
            .position(|shelf| shelf.capacity() >= data.len())
            .ok_or(StoreError::RecordTooLarge { size: data.len(), max: self.max_record_size() })?;

        let slot = self.shelves[index].insert(data)?;
        let id = Self::id(index, slot);
        trace!(target: "blobpool::slotted", id, size = data.len(), "Stored record");
        Ok(id)
    }

    fn get(&self, id: u64) -> Result<Vec<u8>, StoreError> {
        let (shelf, slot) = self.shelf(id)?;
        shelf.read(id, slot)
    }

    fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        let (index, slot) = Self::split(id);
        let shelf = self.shelves.get_mut(index).ok_or(StoreError::UnknownShelf(id))?;
        shelf.delete(id, slot)?;
        trace!(target: "blobpool::slotted", id, "Deleted record");
        Ok(())
    }

    fn close(self) -> Result<(), StoreError> {
        for shelf in &self.shelves {
            shelf.sync()?;
        }
        debug!(target: "blobpool::slotted", path = %self.path.display(), "Closed slotted store");
        Ok(())
    }
}

fn validate_slot_sizes<I: IntoIterator<Item = u32>>(slot_sizes: I) -> Result<Vec<u32>, StoreError> {
    let slot_sizes: Vec<u32> = slot_sizes.into_iter().collect();
    if slot_sizes.is_empty() {
        return Err(StoreError::NoShelves);
    }
    for window in slot_sizes.windows(2) {
        if window[1] <= window[0] {
            return Err(StoreError::UnorderedSlotSizes { previous: window[0], next: window[1] });
        }
    }
    if slot_sizes[0] as usize <= SLOT_HEADER_SIZE {
        return Err(StoreError::SlotSizeTooSmall(slot_sizes[0]));
    }
    Ok(slot_sizes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SIZES: [u32; 3] = [16, 64, 256];

    fn open(dir: &Path) -> (Database, Vec<(u64, Vec<u8>)>) {
        let mut records = Vec::new();
        let db = Database::open(&Options::new(dir), SIZES, |id, size, data| {
            assert_eq!(size as usize, data.len());
            records.push((id, data.to_vec()));
        })
        .expect("open database");
        (db, records)
    }

    #[test]
    fn test_create_and_open_db() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db_path = tmp_dir.path().join("slotted");
        let (db, records) = open(&db_path);

        assert!(records.is_empty());
        assert_eq!(db.path(), db_path);
        assert_eq!(db.slot_sizes().collect::<Vec<_>>(), SIZES);
        assert_eq!(db.max_record_size(), 252);
        for size in SIZES {
            assert!(Database::shelf_path(&db_path, size).exists());
        }
    }

    #[test]
    fn test_invalid_slot_sizes() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let options = Options::new(tmp_dir.path());

        let err = Database::open(&options, [], |_, _, _| {}).unwrap_err();
        assert_eq!(err, StoreError::NoShelves);

        let err = Database::open(&options, [64, 64], |_, _, _| {}).unwrap_err();
        assert_eq!(err, StoreError::UnorderedSlotSizes { previous: 64, next: 64 });

        let err = Database::open(&options, [4, 64], |_, _, _| {}).unwrap_err();
        assert_eq!(err, StoreError::SlotSizeTooSmall(4));
    }

    #[test]
    fn test_records_land_on_smallest_fitting_shelf() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let (mut db, _) = open(tmp_dir.path());

        let small = db.put(&[1; 12]).expect("put");
        let medium = db.put(&[2; 13]).expect("put");
        let large = db.put(&[3; 252]).expect("put");

        assert_eq!(Database::split(small), (0, 0));
        assert_eq!(Database::split(medium), (1, 0));
        assert_eq!(Database::split(large), (2, 0));

        assert_eq!(db.get(small).expect("get"), vec![1; 12]);
        assert_eq!(db.get(medium).expect("get"), vec![2; 13]);
        assert_eq!(db.get(large).expect("get"), vec![3; 252]);
    }

    #[test]
    fn test_rejected_records() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let (mut db, _) = open(tmp_dir.path());

        assert_eq!(db.put(&[]), Err(StoreError::EmptyRecord));
        assert_eq!(db.put(&[0; 253]), Err(StoreError::RecordTooLarge { size: 253, max: 252 }));
    }

    #[test]
    fn test_unknown_ids() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let (mut db, _) = open(tmp_dir.path());

        let bogus = Database::id(7, 0);
        assert_eq!(db.get(bogus), Err(StoreError::UnknownShelf(bogus)));
        assert_eq!(db.delete(bogus), Err(StoreError::UnknownShelf(bogus)));

        let missing = Database::id(1, 3);
        assert_eq!(db.get(missing), Err(StoreError::SlotOutOfBounds(missing)));

        let id = db.put(b"record").expect("put");
        db.delete(id).expect("delete");
        assert!(db.get(id).is_err());
    }

    #[test]
    fn test_reopen_replays_every_shelf() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let (ids, dropped) = {
            let (mut db, _) = open(tmp_dir.path());
            let a = db.put(b"tiny").expect("put");
            let b = db.put(&[7; 100]).expect("put");
            let c = db.put(&[8; 40]).expect("put");
            let d = db.put(b"also tiny").expect("put");
            db.delete(d).expect("delete");
            db.close().expect("close");
            (vec![(a, b"tiny".to_vec()), (c, vec![8; 40]), (b, vec![7; 100])], d)
        };

        let (db, records) = open(tmp_dir.path());
        assert_eq!(records, ids);
        assert!(db.get(dropped).is_err());
    }
}
