#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StoreError;

mod traits;
pub use traits::SlotStore;

mod shelf;
pub use shelf::SLOT_HEADER_SIZE;

mod database;
pub use database::{Database, Options};

#[cfg(any(test, feature = "test-utils"))]
mod memory;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{FailOn, MemoryStore};
