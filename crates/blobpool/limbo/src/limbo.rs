//! The blob limbo: a small indexed store of recently included blobs awaiting finality.

use crate::{
    LimboConfig, LimboEntry, LimboError, Metrics, index::LimboIndex, slotter::limbo_slot_sizes,
};
use alloy_eips::{BlockNumHash, eip4844::BlobTransactionSidecar};
use alloy_primitives::TxHash;
use blobpool_metrics::MetricsReporter;
use blobpool_slotted::{Database, Options, SlotStore, StoreError};
use tracing::{debug, error, trace, warn};

/// Result of [`Limbo::update`].
///
/// Updates never fail the caller; a failure is reported here so the caller can decide whether to
/// surface it.
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The transaction is not held by the limbo. Happens for blob transactions that were mined
    /// without ever being pushed.
    Untracked,
    /// The transaction is already grouped under the requested block.
    Unchanged,
    /// The entry was rewritten under a new inclusion block.
    Moved {
        /// Previous inclusion block.
        from: u64,
        /// New inclusion block.
        to: u64,
    },
    /// Rewriting the entry failed. The entry may have been lost from the limbo.
    Failed(LimboError),
}

impl UpdateOutcome {
    /// Returns the error of a failed update.
    pub const fn error(&self) -> Option<&LimboError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// A finalized entry whose slot could not be deleted from the store.
///
/// The entry is no longer tracked either way; the record stays on disk until it is dropped as a
/// duplicate or swept again after a restart.
#[derive(Debug, PartialEq, Eq)]
pub struct EvictionFailure {
    /// Owner of the entry.
    pub tx: TxHash,
    /// Inclusion block of the entry.
    pub block: u64,
    /// Slot the entry is stored in.
    pub id: u64,
    /// The store error.
    pub error: StoreError,
}

/// Result of [`Limbo::finalize`].
#[derive(Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// No finalized block was known, nothing was evicted.
    NoFinalizedBlock,
    /// Everything included at or below the finalized block was evicted.
    Swept {
        /// Number of entries no longer tracked.
        evicted: usize,
        /// Entries whose slots could not be deleted.
        failures: Vec<EvictionFailure>,
    },
}

/// A light, indexed store holding the blobs of recently included transactions until their
/// block is finalized.
///
/// Blobs are not part of the chain, so once a blob transaction is included its blobs would be
/// gone for good if a reorg later kicked the transaction out again. The limbo keeps them around:
/// - [`push`](Self::push) when a blob transaction is included,
/// - [`update`](Self::update) when a reorg moves its inclusion to another block,
/// - [`pull`](Self::pull) when a reorg removes it, to resurrect it into the pool,
/// - [`finalize`](Self::finalize) when blocks become final, to evict everything at or below.
///
/// Entries are persisted in a [`SlotStore`]; the owner and block-group indices live in memory and
/// are rebuilt from the stored records on [`open`](Self::open).
///
/// The limbo does no locking. Mutating operations take `&mut self`, callers serialize access.
#[derive(Debug)]
pub struct Limbo<S = Database> {
    store: S,
    index: LimboIndex,
    metrics_enabled: bool,
}

impl Limbo<Database> {
    /// Opens the limbo stored in `config.datadir`, indexing every entry found on disk.
    ///
    /// Entries that fail to decode or duplicate an already indexed owner are deleted. Failing to
    /// open the store or to delete such an entry fails the whole open.
    pub fn open(config: &LimboConfig) -> Result<Self, LimboError> {
        let mut records = Vec::new();
        let store = Database::open(
            &Options::new(&config.datadir),
            limbo_slot_sizes(config.max_blobs_per_tx)?,
            |id, _, data| records.push((id, data.to_vec())),
        )?;

        let limbo = Self::recover(store, records)?;
        Ok(if config.metrics_enabled { limbo.with_metrics() } else { limbo })
    }
}

impl<S: SlotStore> Limbo<S> {
    /// Builds a limbo on top of an already opened store from the records it replayed.
    ///
    /// Indexing happens only after the store finished replaying, so the replay itself never
    /// observes a half-built limbo. Records that cannot be indexed are deleted from the store
    /// afterwards; if any deletion fails, the store is closed and the error returned.
    pub fn recover<I>(store: S, records: I) -> Result<Self, LimboError>
    where
        I: IntoIterator<Item = (u64, Vec<u8>)>,
    {
        let mut limbo = Self { store, index: LimboIndex::default(), metrics_enabled: false };

        let fails: Vec<u64> = records
            .into_iter()
            .filter_map(|(id, data)| (!limbo.index_record(id, &data)).then_some(id))
            .collect();

        if !fails.is_empty() {
            warn!(target: "blobpool::limbo", ids = ?fails, "Dropping invalidated limboed blobs");
            if let Err(err) = fails.iter().try_for_each(|id| limbo.store.delete(*id)) {
                error!(target: "blobpool::limbo", %err, "Failed to drop invalidated limboed blobs");
                if let Err(err) = limbo.store.close() {
                    warn!(target: "blobpool::limbo", %err, "Failed to close limbo store");
                }
                return Err(err.into());
            }
        }

        debug!(
            target: "blobpool::limbo",
            tracked = limbo.index.len(),
            dropped = fails.len(),
            "Indexed limboed blobs"
        );
        Ok(limbo)
    }

    /// Enables metrics for limbo operations.
    pub fn with_metrics(mut self) -> Self {
        self.metrics_enabled = true;
        Metrics::init();
        self
    }

    /// Closes the underlying store.
    pub fn close(self) -> Result<(), LimboError> {
        self.store.close()?;
        Ok(())
    }

    /// Returns the number of tracked blob transactions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no blob transaction is tracked.
    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    /// Returns `true` if the blobs of `tx` are held by the limbo.
    pub fn contains(&self, tx: &TxHash) -> bool {
        self.index.contains(tx)
    }

    /// Returns the block `tx` is currently grouped under.
    pub fn tracked_block(&self, tx: &TxHash) -> Option<u64> {
        self.index.slot_of(tx).and_then(|id| self.index.slot(id)).map(|slot| slot.block)
    }

    /// Returns the number of tracked transactions per inclusion block, lowest block first.
    pub fn groups(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.index.groups()
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Stores the blobs of a newly included transaction until its block is finalized.
    ///
    /// # Returns
    /// * `Err(LimboError::AlreadyTracked)` if the transaction is already held, without touching
    ///   the existing entry. This is a programming error on the caller's side.
    /// * `Err(LimboError::Store)` if the entry cannot be written; the limbo is left unchanged.
    pub fn push(
        &mut self,
        tx: TxHash,
        block: u64,
        sidecar: BlobTransactionSidecar,
    ) -> Result<(), LimboError> {
        self.observe_call(Metrics::LIMBO_METHOD_PUSH, |limbo| {
            if limbo.index.contains(&tx) {
                error!(target: "blobpool::limbo", %tx, "Limbo cannot push already tracked blobs");
                return Err(LimboError::AlreadyTracked(tx));
            }
            limbo.set_and_index(tx, block, sidecar).inspect_err(|err| {
                error!(target: "blobpool::limbo", %tx, %err, "Failed to set and index limboed blobs")
            })
        })
    }

    /// Retrieves and removes the blobs of a transaction that was reorged out, so it can be
    /// resurrected into the pool.
    ///
    /// # Returns
    /// * `Err(LimboError::NotTracked)` if the limbo does not hold the transaction. This is normal
    ///   for blob transactions that were mined without ever being pushed.
    pub fn pull(&mut self, tx: TxHash) -> Result<BlobTransactionSidecar, LimboError> {
        self.observe_call(Metrics::LIMBO_METHOD_PULL, |limbo| {
            let Some(id) = limbo.index.slot_of(&tx) else {
                trace!(target: "blobpool::limbo", %tx, "Limbo cannot pull non-tracked blobs");
                return Err(LimboError::NotTracked(tx));
            };
            let entry = limbo.get_and_drop(id).inspect_err(|err| {
                error!(target: "blobpool::limbo", %tx, id, %err, "Failed to get and drop limboed blobs")
            })?;
            Ok(entry.into_sidecar())
        })
    }

    /// Moves a transaction to a new inclusion block after a reorg re-included it elsewhere.
    ///
    /// Never fails the caller: a reorg path must not be blocked by limbo bookkeeping. Errors are
    /// logged and handed back inside [`UpdateOutcome::Failed`].
    pub fn update(&mut self, tx: TxHash, block: u64) -> UpdateOutcome {
        self.observe_call(Metrics::LIMBO_METHOD_UPDATE, |limbo| match limbo.rehome(tx, block) {
            UpdateOutcome::Failed(err) => Err(err),
            outcome => Ok(outcome),
        })
        .unwrap_or_else(UpdateOutcome::Failed)
    }

    /// Evicts every entry included at or below the finalized block.
    ///
    /// Deletion failures are logged and collected, the sweep carries on with the remaining
    /// entries. Without a finalized block (not yet produced by consensus) nothing happens.
    pub fn finalize(&mut self, finalized: Option<BlockNumHash>) -> FinalizeOutcome {
        let Some(finalized) = finalized else {
            error!(target: "blobpool::limbo", "Nil finalized block cannot evict old blobs");
            return FinalizeOutcome::NoFinalizedBlock;
        };

        let evicted = self.index.split_finalized(finalized.number);
        let mut failures = Vec::new();
        for slot in &evicted {
            if let Err(err) = self.store.delete(slot.id) {
                error!(
                    target: "blobpool::limbo",
                    block = slot.block,
                    id = slot.id,
                    %err,
                    "Failed to drop finalized blob"
                );
                failures.push(EvictionFailure {
                    tx: slot.owner,
                    block: slot.block,
                    id: slot.id,
                    error: err,
                });
            }
        }

        if self.metrics_enabled {
            metrics::counter!(Metrics::LIMBO_EVICTED_TOTAL).increment(evicted.len() as u64);
            metrics::counter!(Metrics::LIMBO_EVICTION_FAILURES_TOTAL)
                .increment(failures.len() as u64);
        }
        debug!(
            target: "blobpool::limbo",
            finalized = finalized.number,
            evicted = evicted.len(),
            failed = failures.len(),
            "Evicted finalized blobs"
        );
        FinalizeOutcome::Swept { evicted: evicted.len(), failures }
    }

    fn rehome(&mut self, tx: TxHash, block: u64) -> UpdateOutcome {
        let Some(id) = self.index.slot_of(&tx) else {
            trace!(target: "blobpool::limbo", %tx, "Limbo cannot update non-tracked blobs");
            return UpdateOutcome::Untracked;
        };
        if self.index.slot(id).is_some_and(|slot| slot.block == block) {
            trace!(target: "blobpool::limbo", %tx, block, "Blob transaction unchanged in limbo");
            return UpdateOutcome::Unchanged;
        }

        let entry = match self.get_and_drop(id) {
            Ok(entry) => entry,
            Err(err) => {
                error!(target: "blobpool::limbo", %tx, id, %err, "Failed to get and drop limboed blobs");
                return UpdateOutcome::Failed(err);
            }
        };
        let from = entry.block;
        if let Err(err) = self.set_and_index(tx, block, entry.into_sidecar()) {
            error!(target: "blobpool::limbo", %tx, %err, "Failed to set and index limboed blobs");
            return UpdateOutcome::Failed(err);
        }

        trace!(target: "blobpool::limbo", %tx, from, to = block, "Blob transaction updated in limbo");
        UpdateOutcome::Moved { from, to: block }
    }

    /// Decodes a replayed record and registers it. Returns `false` if the record must be dropped.
    fn index_record(&mut self, id: u64, data: &[u8]) -> bool {
        let entry = match LimboEntry::decode_exact(data) {
            Ok(entry) => entry,
            Err(err) => {
                // Only reachable if the on-disk format changed across restarts.
                error!(target: "blobpool::limbo", id, %err, "Failed to decode blob limbo entry");
                return false;
            }
        };
        if !self.index.insert(entry.owner, entry.block, id) {
            error!(
                target: "blobpool::limbo",
                owner = %entry.owner,
                id,
                "Dropping duplicate blob limbo entry"
            );
            return false;
        }
        true
    }

    /// Retrieves an entry from the store and removes it from both the store and the indices.
    ///
    /// The indices are updated with the owner and block decoded from the entry itself.
    fn get_and_drop(&mut self, id: u64) -> Result<LimboEntry, LimboError> {
        let data = self.store.get(id)?;
        let entry = LimboEntry::decode_exact(&data)?;

        self.index.remove(entry.owner, entry.block, id);
        self.store.delete(id)?;
        Ok(entry)
    }

    /// Stores a new entry and registers it in the indices.
    fn set_and_index(
        &mut self,
        tx: TxHash,
        block: u64,
        sidecar: BlobTransactionSidecar,
    ) -> Result<(), LimboError> {
        let entry = LimboEntry::new(tx, block, sidecar);
        let id = self.store.put(&entry.encoded())?;

        if !self.index.insert(tx, block, id) {
            self.store.delete(id)?;
            return Err(LimboError::AlreadyTracked(tx));
        }
        Ok(())
    }

    fn observe_call<T, F>(&mut self, name: &'static str, f: F) -> Result<T, LimboError>
    where
        F: FnOnce(&mut Self) -> Result<T, LimboError>,
    {
        if self.metrics_enabled { Metrics::CALLS.observe(name, || f(self)) } else { f(self) }
    }
}

impl<S: SlotStore> MetricsReporter for Limbo<S> {
    fn report_metrics(&self) {
        if self.metrics_enabled {
            metrics::gauge!(Metrics::LIMBO_TRACKED_ENTRIES).set(self.index.len() as f64);
            metrics::gauge!(Metrics::LIMBO_TRACKED_BLOCKS).set(self.index.groups().count() as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sidecar;
    use alloy_primitives::B256;
    use blobpool_slotted::{FailOn, MemoryStore};
    use rstest::{fixture, rstest};

    fn tx(byte: u8) -> TxHash {
        B256::repeat_byte(byte)
    }

    fn finalized(number: u64) -> Option<BlockNumHash> {
        Some(BlockNumHash { number, hash: B256::repeat_byte(0xf1) })
    }

    fn encoded(owner: TxHash, block: u64, seed: u8) -> Vec<u8> {
        LimboEntry::new(owner, block, sidecar(seed, 1)).encoded()
    }

    #[fixture]
    fn limbo() -> Limbo<MemoryStore> {
        Limbo::recover(MemoryStore::new(), []).expect("recover empty limbo")
    }

    #[rstest]
    fn test_push_then_pull(mut limbo: Limbo<MemoryStore>) {
        let blobs = sidecar(1, 2);
        limbo.push(tx(1), 100, blobs.clone()).expect("push");

        assert!(limbo.contains(&tx(1)));
        assert_eq!(limbo.tracked_block(&tx(1)), Some(100));
        assert_eq!(limbo.store().len(), 1);

        assert_eq!(limbo.pull(tx(1)).expect("pull"), blobs);
        assert!(!limbo.contains(&tx(1)));
        assert!(limbo.is_empty());
        assert!(limbo.store().is_empty());
        assert_eq!(limbo.pull(tx(1)), Err(LimboError::NotTracked(tx(1))));
    }

    #[rstest]
    fn test_push_rejects_tracked_owner(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 100, sidecar(1, 1)).expect("push");

        assert_eq!(
            limbo.push(tx(1), 200, sidecar(2, 1)),
            Err(LimboError::AlreadyTracked(tx(1)))
        );
        assert_eq!(limbo.store().len(), 1);
        assert_eq!(limbo.tracked_block(&tx(1)), Some(100));
        assert_eq!(limbo.pull(tx(1)).expect("pull"), sidecar(1, 1));
    }

    #[rstest]
    fn test_push_store_failure_leaves_no_trace(mut limbo: Limbo<MemoryStore>) {
        limbo.store.fail_next(FailOn::Put, 1);

        assert!(matches!(limbo.push(tx(1), 100, sidecar(1, 1)), Err(LimboError::Store(_))));
        assert!(limbo.is_empty());
        assert_eq!(limbo.groups().count(), 0);

        // The same transaction can be pushed once the store recovers.
        limbo.push(tx(1), 100, sidecar(1, 1)).expect("push");
        assert!(limbo.contains(&tx(1)));
    }

    #[rstest]
    fn test_pull_store_failure_keeps_entry(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 100, sidecar(1, 1)).expect("push");
        limbo.store.fail_next(FailOn::Get, 1);

        assert!(matches!(limbo.pull(tx(1)), Err(LimboError::Store(_))));
        assert!(limbo.contains(&tx(1)));
        assert_eq!(limbo.pull(tx(1)).expect("pull"), sidecar(1, 1));
    }

    #[rstest]
    fn test_update_untracked(mut limbo: Limbo<MemoryStore>) {
        assert_eq!(limbo.update(tx(1), 5), UpdateOutcome::Untracked);
        assert!(limbo.is_empty());
    }

    #[rstest]
    fn test_update_same_block_is_noop(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 100, sidecar(1, 1)).expect("push");
        let id = limbo.index.slot_of(&tx(1)).expect("tracked");

        assert_eq!(limbo.update(tx(1), 100), UpdateOutcome::Unchanged);

        // No slot was rewritten.
        assert_eq!(limbo.index.slot_of(&tx(1)), Some(id));
        assert_eq!(limbo.store().replay().len(), 1);
        assert!(limbo.store().contains(id));
        assert_eq!(limbo.groups().collect::<Vec<_>>(), vec![(100, 1)]);
    }

    #[rstest]
    fn test_update_moves_entry(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 100, sidecar(1, 3)).expect("push");
        limbo.push(tx(2), 100, sidecar(2, 1)).expect("push");

        assert_eq!(limbo.update(tx(1), 101), UpdateOutcome::Moved { from: 100, to: 101 });
        assert_eq!(limbo.tracked_block(&tx(1)), Some(101));
        assert_eq!(limbo.groups().collect::<Vec<_>>(), vec![(100, 1), (101, 1)]);
        assert_eq!(limbo.store().len(), 2);

        assert_eq!(limbo.pull(tx(1)).expect("pull"), sidecar(1, 3));
    }

    #[rstest]
    fn test_update_failure_is_reported(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 100, sidecar(1, 1)).expect("push");
        limbo.store.fail_next(FailOn::Get, 1);

        let outcome = limbo.update(tx(1), 101);
        assert!(matches!(outcome.error(), Some(LimboError::Store(_))));
        // Nothing was removed yet when the read failed.
        assert_eq!(limbo.tracked_block(&tx(1)), Some(100));

        limbo.store.fail_next(FailOn::Put, 1);
        let outcome = limbo.update(tx(1), 101);
        assert!(matches!(outcome, UpdateOutcome::Failed(LimboError::Store(_))));
        // The old entry was already dropped when the rewrite failed.
        assert!(!limbo.contains(&tx(1)));
        assert!(limbo.store().is_empty());
    }

    #[rstest]
    fn test_finalize_without_finalized_block(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 1, sidecar(1, 1)).expect("push");
        assert_eq!(limbo.finalize(None), FinalizeOutcome::NoFinalizedBlock);
        assert!(limbo.contains(&tx(1)));
    }

    #[rstest]
    fn test_finalize_sweeps_old_blocks(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 10, sidecar(1, 1)).expect("push");
        limbo.push(tx(2), 11, sidecar(2, 1)).expect("push");
        limbo.push(tx(3), 12, sidecar(3, 1)).expect("push");

        assert_eq!(
            limbo.finalize(finalized(11)),
            FinalizeOutcome::Swept { evicted: 2, failures: vec![] }
        );
        assert_eq!(limbo.pull(tx(1)), Err(LimboError::NotTracked(tx(1))));
        assert_eq!(limbo.pull(tx(2)), Err(LimboError::NotTracked(tx(2))));
        assert_eq!(limbo.store().len(), 1);
        assert_eq!(limbo.pull(tx(3)).expect("pull"), sidecar(3, 1));
    }

    #[rstest]
    fn test_finalize_is_idempotent(mut limbo: Limbo<MemoryStore>) {
        assert_eq!(limbo.finalize(finalized(5)), FinalizeOutcome::Swept { evicted: 0, failures: vec![] });

        limbo.push(tx(1), 10, sidecar(1, 1)).expect("push");
        assert_eq!(limbo.finalize(finalized(9)), FinalizeOutcome::Swept { evicted: 0, failures: vec![] });
        assert_eq!(limbo.finalize(finalized(10)), FinalizeOutcome::Swept { evicted: 1, failures: vec![] });
        assert_eq!(limbo.finalize(finalized(10)), FinalizeOutcome::Swept { evicted: 0, failures: vec![] });
        assert_eq!(limbo.finalize(finalized(3)), FinalizeOutcome::Swept { evicted: 0, failures: vec![] });
    }

    #[rstest]
    fn test_finalize_continues_past_delete_failures(mut limbo: Limbo<MemoryStore>) {
        limbo.push(tx(1), 10, sidecar(1, 1)).expect("push");
        limbo.push(tx(2), 10, sidecar(2, 1)).expect("push");
        limbo.store.fail_next(FailOn::Delete, 1);

        let FinalizeOutcome::Swept { evicted, failures } = limbo.finalize(finalized(10)) else {
            panic!("expected a sweep");
        };
        assert_eq!(evicted, 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].block, 10);
        assert!(limbo.is_empty());
        assert_eq!(limbo.store().len(), 1);
    }

    #[test]
    fn test_recover_rebuilds_indices() {
        let store = MemoryStore::with_records([
            encoded(tx(1), 10, 1),
            encoded(tx(2), 10, 2),
            encoded(tx(3), 12, 3),
        ]);
        let records = store.replay();
        let mut limbo = Limbo::recover(store, records).expect("recover");

        assert_eq!(limbo.len(), 3);
        assert_eq!(limbo.groups().collect::<Vec<_>>(), vec![(10, 2), (12, 1)]);
        assert_eq!(limbo.pull(tx(3)).expect("pull"), sidecar(3, 1));
    }

    #[test]
    fn test_recover_drops_undecodable_and_duplicate_records() {
        let store = MemoryStore::with_records([
            encoded(tx(1), 10, 1),
            b"garbage".to_vec(),
            encoded(tx(1), 20, 9),
            encoded(tx(2), 11, 2),
        ]);
        let records = store.replay();
        let mut limbo = Limbo::recover(store, records).expect("recover");

        assert_eq!(limbo.len(), 2);
        assert_eq!(limbo.store().replay().iter().map(|(id, _)| *id).collect::<Vec<_>>(), [0, 3]);
        // First seen wins.
        assert_eq!(limbo.tracked_block(&tx(1)), Some(10));
        assert_eq!(limbo.pull(tx(1)).expect("pull"), sidecar(1, 1));
    }

    #[test]
    fn test_recover_fails_when_drop_fails() {
        let mut store = MemoryStore::with_records([encoded(tx(1), 10, 1), b"garbage".to_vec()]);
        store.fail_next(FailOn::Delete, 1);
        let records = store.replay();

        assert!(matches!(Limbo::recover(store, records), Err(LimboError::Store(_))));
    }

    #[rstest]
    fn test_metrics_enabled_operations(limbo: Limbo<MemoryStore>) {
        let mut limbo = limbo.with_metrics();
        limbo.push(tx(1), 1, sidecar(1, 1)).expect("push");
        assert_eq!(limbo.update(tx(1), 2), UpdateOutcome::Moved { from: 1, to: 2 });
        limbo.report_metrics();
        assert_eq!(limbo.finalize(finalized(2)), FinalizeOutcome::Swept { evicted: 1, failures: vec![] });
        assert_eq!(limbo.pull(tx(1)), Err(LimboError::NotTracked(tx(1))));
    }
}
