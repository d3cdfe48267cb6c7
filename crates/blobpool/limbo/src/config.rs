use crate::slotter::DEFAULT_MAX_BLOBS_PER_TX;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration of a [`Limbo`](crate::Limbo) backed by the on-disk slotted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimboConfig {
    /// Directory holding the limbo's shelf files.
    pub datadir: PathBuf,
    /// Largest number of blobs a transaction may carry. Determines the shelf layout.
    pub max_blobs_per_tx: u32,
    /// Whether to record metrics for limbo operations.
    pub metrics_enabled: bool,
}

impl Default for LimboConfig {
    fn default() -> Self {
        Self {
            datadir: PathBuf::from("limbo"),
            max_blobs_per_tx: DEFAULT_MAX_BLOBS_PER_TX,
            metrics_enabled: false,
        }
    }
}

impl LimboConfig {
    /// Creates a new [`LimboConfig`] storing its data under `datadir`.
    pub fn new(datadir: impl Into<PathBuf>) -> Self {
        Self { datadir: datadir.into(), ..Default::default() }
    }

    /// Sets the largest number of blobs a transaction may carry.
    pub const fn with_max_blobs_per_tx(mut self, max_blobs_per_tx: u32) -> Self {
        self.max_blobs_per_tx = max_blobs_per_tx;
        self
    }

    /// Enables metrics.
    pub const fn with_metrics(mut self) -> Self {
        self.metrics_enabled = true;
        self
    }
}
