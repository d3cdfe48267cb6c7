//! Inspect Subcommand

use crate::flags::LimboArgs;
use anyhow::Result;
use blobpool_limbo::Limbo;
use clap::Parser;
use serde::Serialize;
use tracing::info;

/// The `inspect` Subcommand
///
/// Opens the limbo and prints how many entries it tracks per inclusion block.
///
/// # Usage
///
/// ```sh
/// limbo inspect --datadir <DIR> [--json]
/// ```
#[derive(Parser, PartialEq, Debug, Clone)]
#[command(about = "Prints the entries tracked by a limbo")]
pub struct InspectCommand {
    /// The limbo to inspect.
    #[command(flatten)]
    pub limbo: LimboArgs,
    /// Prints the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Tracked entries of a limbo, grouped by inclusion block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimboSummary {
    /// Total number of tracked entries.
    pub entries: usize,
    /// Entry count per inclusion block, lowest block first.
    pub blocks: Vec<BlockSummary>,
}

/// Entries included in a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// Inclusion block number.
    pub block: u64,
    /// Number of entries included in the block.
    pub entries: usize,
}

impl From<&Limbo> for LimboSummary {
    fn from(limbo: &Limbo) -> Self {
        Self {
            entries: limbo.len(),
            blocks: limbo
                .groups()
                .map(|(block, entries)| BlockSummary { block, entries })
                .collect(),
        }
    }
}

impl InspectCommand {
    /// Runs the subcommand.
    pub fn run(self) -> Result<()> {
        let limbo = self.limbo.open()?;
        let summary = LimboSummary::from(&limbo);
        limbo.close()?;
        info!(target: "cli", entries = summary.entries, "Inspected limbo");

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("--------------------------");
        println!("Path: {}", self.limbo.datadir.display());
        println!("Tracked entries: {}", summary.entries);
        for group in &summary.blocks {
            println!("  block {:>12}: {}", group.block, group.entries);
        }
        println!("--------------------------");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use blobpool_limbo::{LimboConfig, test_utils::sidecar};
    use tempfile::TempDir;

    #[test]
    fn test_summary_groups_by_block() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let mut limbo = Limbo::open(&LimboConfig::new(tmp_dir.path())).expect("open limbo");
        limbo.push(B256::repeat_byte(1), 12, sidecar(1, 1)).expect("push");
        limbo.push(B256::repeat_byte(2), 10, sidecar(2, 2)).expect("push");
        limbo.push(B256::repeat_byte(3), 12, sidecar(3, 1)).expect("push");

        let summary = LimboSummary::from(&limbo);
        assert_eq!(summary.entries, 3);
        assert_eq!(
            summary.blocks,
            vec![BlockSummary { block: 10, entries: 1 }, BlockSummary { block: 12, entries: 2 }]
        );

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["blocks"][1]["entries"], 2);
    }
}
