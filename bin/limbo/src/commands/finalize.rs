//! Finalize Subcommand

use crate::flags::LimboArgs;
use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use anyhow::{Result, bail};
use blobpool_limbo::FinalizeOutcome;
use clap::Parser;
use tracing::{info, warn};

/// The `finalize` Subcommand
///
/// Evicts every entry included at or below the given block, as if it had just been finalized.
///
/// # Usage
///
/// ```sh
/// limbo finalize --datadir <DIR> --block <NUMBER>
/// ```
#[derive(Parser, PartialEq, Debug, Clone)]
#[command(about = "Evicts every entry included at or below a block")]
pub struct FinalizeCommand {
    /// The limbo to sweep.
    #[command(flatten)]
    pub limbo: LimboArgs,
    /// The finalized block number.
    #[arg(long)]
    pub block: u64,
}

impl FinalizeCommand {
    /// Runs the subcommand.
    pub fn run(self) -> Result<()> {
        let mut limbo = self.limbo.open()?;
        // Only the number takes part in the sweep.
        let finalized = BlockNumHash { number: self.block, hash: B256::ZERO };
        let outcome = limbo.finalize(Some(finalized));
        limbo.close()?;

        let FinalizeOutcome::Swept { evicted, failures } = outcome else {
            bail!("no finalized block to sweep");
        };
        for failure in &failures {
            warn!(
                target: "cli",
                tx = %failure.tx,
                block = failure.block,
                err = %failure.error,
                "Finalized entry left on disk"
            );
        }
        info!(target: "cli", block = self.block, evicted, "Swept finalized entries");
        println!("Evicted {evicted} entries at or below block {}", self.block);

        if !failures.is_empty() {
            bail!("failed to delete {} of {evicted} finalized entries", failures.len());
        }
        Ok(())
    }
}
