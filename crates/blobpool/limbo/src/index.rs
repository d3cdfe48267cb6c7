//! In-memory indices over the limbo's stored entries.

use alloy_primitives::TxHash;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What the index knows about a single stored slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrackedSlot {
    pub(crate) owner: TxHash,
    pub(crate) block: u64,
}

/// A slot removed from the index by a finality sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EvictedSlot {
    pub(crate) id: u64,
    pub(crate) owner: TxHash,
    pub(crate) block: u64,
}

/// Owner and block-group indices over the store's slot ids.
///
/// Both indices are rebuilt from the stored entries on startup, nothing here is persisted.
#[derive(Debug, Default)]
pub(crate) struct LimboIndex {
    /// Transaction hash to slot id.
    owners: HashMap<TxHash, u64>,
    /// Slot id to its owner and inclusion block.
    slots: HashMap<u64, TrackedSlot>,
    /// Inclusion block to the slots included in it, ordered for finality sweeps.
    groups: BTreeMap<u64, BTreeSet<u64>>,
}

impl LimboIndex {
    pub(crate) fn len(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn contains(&self, owner: &TxHash) -> bool {
        self.owners.contains_key(owner)
    }

    pub(crate) fn slot_of(&self, owner: &TxHash) -> Option<u64> {
        self.owners.get(owner).copied()
    }

    pub(crate) fn slot(&self, id: u64) -> Option<TrackedSlot> {
        self.slots.get(&id).copied()
    }

    /// Returns the number of tracked slots per block, lowest block first.
    pub(crate) fn groups(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.groups.iter().map(|(block, ids)| (*block, ids.len()))
    }

    /// Registers slot `id` for `owner` in `block`.
    ///
    /// Returns `false` without touching the index if `owner` is already tracked.
    pub(crate) fn insert(&mut self, owner: TxHash, block: u64, id: u64) -> bool {
        if self.owners.contains_key(&owner) {
            return false;
        }
        self.owners.insert(owner, id);
        self.slots.insert(id, TrackedSlot { owner, block });
        self.groups.entry(block).or_default().insert(id);
        true
    }

    /// Unregisters slot `id`, using the owner and block decoded from the stored entry.
    ///
    /// Whatever the index itself recorded for the slot is cleared as well, so a disagreement
    /// between stored content and index never leaves a dangling id behind.
    pub(crate) fn remove(&mut self, owner: TxHash, block: u64, id: u64) {
        self.owners.remove(&owner);
        self.remove_from_group(block, id);

        if let Some(tracked) = self.slots.remove(&id) {
            if tracked.owner != owner && self.owners.get(&tracked.owner) == Some(&id) {
                self.owners.remove(&tracked.owner);
            }
            if tracked.block != block {
                self.remove_from_group(tracked.block, id);
            }
        }
    }

    /// Removes every group at or below `number` and returns the slots they held.
    pub(crate) fn split_finalized(&mut self, number: u64) -> Vec<EvictedSlot> {
        let kept = match number.checked_add(1) {
            Some(first_kept) => self.groups.split_off(&first_kept),
            None => BTreeMap::new(),
        };
        let finalized = std::mem::replace(&mut self.groups, kept);

        let mut evicted = Vec::with_capacity(finalized.values().map(BTreeSet::len).sum());
        for (block, ids) in finalized {
            for id in ids {
                let Some(tracked) = self.slots.remove(&id) else { continue };
                self.owners.remove(&tracked.owner);
                evicted.push(EvictedSlot { id, owner: tracked.owner, block });
            }
        }
        evicted
    }

    fn remove_from_group(&mut self, block: u64, id: u64) {
        if let Some(ids) = self.groups.get_mut(&block) {
            ids.remove(&id);
            if ids.is_empty() {
                self.groups.remove(&block);
            }
        }
    }
}
