//! Helpers for building blob payloads in tests.

use alloy_eips::eip4844::{Blob, BlobTransactionSidecar, Bytes48};

/// Builds a sidecar of `blobs` blobs whose contents are derived from `seed`.
pub fn sidecar(seed: u8, blobs: usize) -> BlobTransactionSidecar {
    BlobTransactionSidecar::new(
        vec![Blob::repeat_byte(seed); blobs],
        vec![Bytes48::repeat_byte(seed.wrapping_add(1)); blobs],
        vec![Bytes48::repeat_byte(seed.wrapping_add(2)); blobs],
    )
}
