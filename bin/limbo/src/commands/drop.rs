//! Drop Subcommand

use crate::flags::LimboArgs;
use alloy_primitives::TxHash;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

/// The `drop` Subcommand
///
/// Pulls a single transaction's blobs out of the limbo and discards them.
///
/// # Usage
///
/// ```sh
/// limbo drop --datadir <DIR> --tx <HASH>
/// ```
#[derive(Parser, PartialEq, Debug, Clone)]
#[command(about = "Removes a single transaction's blobs from a limbo")]
pub struct DropCommand {
    /// The limbo to drop from.
    #[command(flatten)]
    pub limbo: LimboArgs,
    /// Hash of the transaction whose blobs are dropped.
    #[arg(long)]
    pub tx: TxHash,
}

impl DropCommand {
    /// Runs the subcommand.
    pub fn run(self) -> Result<()> {
        let mut limbo = self.limbo.open()?;
        let pulled = limbo.pull(self.tx);
        limbo.close()?;

        let sidecar = pulled.with_context(|| format!("failed to drop {}", self.tx))?;
        info!(target: "cli", tx = %self.tx, blobs = sidecar.blobs.len(), "Dropped limboed blobs");
        println!("Dropped {} blobs of {}", sidecar.blobs.len(), self.tx);
        Ok(())
    }
}
