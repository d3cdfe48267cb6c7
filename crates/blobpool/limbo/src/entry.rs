//! The record persisted for every limboed blob transaction.

use alloy_eips::eip4844::{Blob, BlobTransactionSidecar, Bytes48};
use alloy_primitives::TxHash;
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};

/// An opaque blob set together with the transaction it belongs to and the block that included
/// it.
///
/// The entry is stored as an RLP list `[owner, block, blobs, commitments, proofs]`. The limbo does
/// not check that the three payload lists line up; that is up to whoever pushed them.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct LimboEntry {
    /// Hash of the owning transaction, used to resurrect it after a reorg.
    pub owner: TxHash,
    /// Block in which the transaction was included.
    pub block: u64,
    /// The opaque blobs originally part of the transaction.
    pub blobs: Vec<Blob>,
    /// The commitments for the blobs.
    pub commitments: Vec<Bytes48>,
    /// The proofs verifying the commitments.
    pub proofs: Vec<Bytes48>,
}

impl LimboEntry {
    /// Creates a new [`LimboEntry`] from a transaction's blob sidecar.
    pub fn new(owner: TxHash, block: u64, sidecar: BlobTransactionSidecar) -> Self {
        let BlobTransactionSidecar { blobs, commitments, proofs } = sidecar;
        Self { owner, block, blobs, commitments, proofs }
    }

    /// Encodes the entry into the bytes written to the store.
    pub fn encoded(&self) -> Vec<u8> {
        alloy_rlp::encode(self)
    }

    /// Decodes an entry from stored bytes, rejecting trailing data.
    pub fn decode_exact(mut data: &[u8]) -> alloy_rlp::Result<Self> {
        let entry = Self::decode(&mut data)?;
        if !data.is_empty() {
            return Err(alloy_rlp::Error::UnexpectedLength);
        }
        Ok(entry)
    }

    /// Returns the number of blobs carried by the entry.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Converts the entry back into the blob sidecar it was created from.
    pub fn into_sidecar(self) -> BlobTransactionSidecar {
        BlobTransactionSidecar::new(self.blobs, self.commitments, self.proofs)
    }
}
