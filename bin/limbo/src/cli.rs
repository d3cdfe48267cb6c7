//! Contains the limbo CLI.

use crate::commands::{DropCommand, FinalizeCommand, InspectCommand};
use anyhow::Result;
use blobpool_cli::{LogArgs, LogConfig};
use clap::{Parser, Subcommand};

/// Subcommands for the CLI.
#[derive(Debug, PartialEq, Clone, Subcommand)]
pub enum Commands {
    /// Prints the entries tracked by a limbo.
    #[command(alias = "i")]
    Inspect(InspectCommand),
    /// Evicts every entry included at or below a block.
    #[command(alias = "f")]
    Finalize(FinalizeCommand),
    /// Removes a single transaction's blobs.
    #[command(alias = "rm")]
    Drop(DropCommand),
}

/// The limbo CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Inspect and maintain a blob limbo", long_about = None)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub subcommand: Commands,
    /// Logging arguments.
    #[command(flatten)]
    pub global: LogArgs,
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        self.init_logs()?;

        match self.subcommand {
            Commands::Inspect(inspect) => inspect.run(),
            Commands::Finalize(finalize) => finalize.run(),
            Commands::Drop(drop) => drop.run(),
        }
    }

    /// Initializes the tracing subscriber. `RUST_LOG` directives refine the verbosity flags.
    pub fn init_logs(&self) -> Result<()> {
        let filter = tracing_subscriber::EnvFilter::from_default_env();
        LogConfig::from(self.global.clone()).init_tracing_subscriber(Some(filter))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case::inspect_long("inspect")]
    #[case::inspect_short("i")]
    fn test_parse_inspect(#[case] alias: &str) {
        let cli = Cli::parse_from(["limbo", alias, "--datadir", "/data/limbo", "--json"]);
        let Commands::Inspect(inspect) = cli.subcommand else { panic!("expected inspect") };
        assert!(inspect.json);
        assert_eq!(inspect.limbo.datadir, PathBuf::from("/data/limbo"));
        assert_eq!(inspect.limbo.max_blobs_per_tx, 6);
    }

    #[test]
    fn test_parse_finalize() {
        let cli = Cli::parse_from([
            "limbo",
            "-vv",
            "finalize",
            "--datadir",
            "/data",
            "--block",
            "42",
            "--max-blobs",
            "9",
        ]);
        let Commands::Finalize(finalize) = cli.subcommand else { panic!("expected finalize") };
        assert_eq!(finalize.block, 42);
        assert_eq!(finalize.limbo.max_blobs_per_tx, 9);
        assert_eq!(cli.global.level, 2);
    }

    #[rstest]
    #[case::drop_long("drop")]
    #[case::drop_short("rm")]
    fn test_parse_drop(#[case] alias: &str) {
        let hash = B256::repeat_byte(0xab);
        let cli = Cli::parse_from(["limbo", alias, "--datadir", "/data", "--tx", &hash.to_string()]);
        let Commands::Drop(drop) = cli.subcommand else { panic!("expected drop") };
        assert_eq!(drop.tx, hash);
    }

    #[rstest]
    #[case::missing_datadir(&["limbo", "inspect"])]
    #[case::missing_block(&["limbo", "finalize", "--datadir", "/data"])]
    #[case::invalid_hash(&["limbo", "drop", "--datadir", "/data", "--tx", "0x12"])]
    #[case::zero_blobs(&["limbo", "inspect", "--datadir", "/data", "--max-blobs", "0"])]
    #[case::too_many_blobs(&["limbo", "inspect", "--datadir", "/data", "--max-blobs", "40000"])]
    fn test_parse_rejects(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
