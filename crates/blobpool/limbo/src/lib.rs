#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::LimboError;

mod entry;
pub use entry::LimboEntry;

mod slotter;
pub use slotter::{
    DEFAULT_MAX_BLOBS_PER_TX, ENTRY_OVERHEAD, MAX_BLOBS_PER_TX_LIMIT, PER_BLOB_SIZE, limbo_slot_sizes,
};

mod config;
pub use config::LimboConfig;

mod index;

mod limbo;
pub use limbo::{EvictionFailure, FinalizeOutcome, Limbo, UpdateOutcome};

mod metrics;
pub(crate) use metrics::Metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
