//! Flags shared by the limbo subcommands.

use anyhow::{Context, Result};
use blobpool_limbo::{DEFAULT_MAX_BLOBS_PER_TX, Limbo, LimboConfig, MAX_BLOBS_PER_TX_LIMIT};
use clap::Args;
use std::path::PathBuf;

/// Location and layout of the limbo to operate on.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LimboArgs {
    /// Directory holding the limbo's shelf files.
    #[arg(long, env = "LIMBO_DATADIR")]
    pub datadir: PathBuf,

    /// Largest number of blobs a transaction may carry. Must match the value the limbo was
    /// written with, otherwise entries end up on unexpected shelves.
    #[arg(
        long = "max-blobs",
        env = "LIMBO_MAX_BLOBS",
        default_value_t = DEFAULT_MAX_BLOBS_PER_TX,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_BLOBS_PER_TX_LIMIT))
    )]
    pub max_blobs_per_tx: u32,
}

impl LimboArgs {
    /// Returns the [`LimboConfig`] described by the flags.
    pub fn config(&self) -> LimboConfig {
        LimboConfig::new(&self.datadir).with_max_blobs_per_tx(self.max_blobs_per_tx)
    }

    /// Opens the limbo, running recovery.
    pub fn open(&self) -> Result<Limbo> {
        Limbo::open(&self.config())
            .with_context(|| format!("failed to open limbo at {}", self.datadir.display()))
    }
}
