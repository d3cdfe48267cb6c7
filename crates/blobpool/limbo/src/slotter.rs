//! Shelf sizes for the limbo's slotted store.

use crate::LimboError;
use alloy_eips::eip4844::BYTES_PER_BLOB;

/// Size of a KZG commitment or proof.
const BYTES_PER_COMMITMENT: usize = 48;

/// Space taken by one blob, its commitment and its proof inside an encoded entry, RLP string
/// headers included.
pub const PER_BLOB_SIZE: u32 = (BYTES_PER_BLOB + 4 + 2 * (BYTES_PER_COMMITMENT + 1)) as u32;

/// Space reserved per entry for everything but the blobs: the slot header, the list headers, the
/// owner hash and the block number.
pub const ENTRY_OVERHEAD: u32 = 1024;

/// Default maximum number of blobs a single transaction may carry.
pub const DEFAULT_MAX_BLOBS_PER_TX: u32 = 6;

/// Largest `max_blobs_per_tx` whose shelf sizes still fit in a `u32`.
pub const MAX_BLOBS_PER_TX_LIMIT: u32 = (u32::MAX - ENTRY_OVERHEAD) / PER_BLOB_SIZE;

/// Returns the slot sizes used by the limbo store: one shelf per possible blob count, so that an
/// entry with `n` blobs lands on the `n`-th shelf.
///
/// # Returns
/// * `Err(LimboError::TooManyBlobs)` if `max_blobs_per_tx` exceeds [`MAX_BLOBS_PER_TX_LIMIT`].
pub fn limbo_slot_sizes(max_blobs_per_tx: u32) -> Result<impl Iterator<Item = u32>, LimboError> {
    if max_blobs_per_tx > MAX_BLOBS_PER_TX_LIMIT {
        return Err(LimboError::TooManyBlobs {
            requested: max_blobs_per_tx,
            max: MAX_BLOBS_PER_TX_LIMIT,
        });
    }
    Ok((1..=max_blobs_per_tx).map(|blobs| ENTRY_OVERHEAD + blobs * PER_BLOB_SIZE))
}
