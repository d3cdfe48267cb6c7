use alloy_primitives::TxHash;
use blobpool_slotted::StoreError;
use thiserror::Error;

/// Errors that may occur while interacting with the blob limbo.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimboError {
    /// The transaction's blobs are already held by the limbo.
    #[error("blob transaction {0} is already tracked")]
    AlreadyTracked(TxHash),

    /// The transaction's blobs are not held by the limbo.
    #[error("blob transaction {0} is not tracked")]
    NotTracked(TxHash),

    /// The configured blob count per transaction yields shelf sizes beyond `u32`.
    #[error("max blobs per transaction {requested} exceeds the supported maximum of {max}")]
    TooManyBlobs {
        /// The configured value.
        requested: u32,
        /// The largest supported value.
        max: u32,
    },

    /// Represents an error raised by the underlying slotted store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored record could not be decoded into a limbo entry.
    #[error("failed to decode limbo entry: {0}")]
    Decode(#[from] alloy_rlp::Error),
}
