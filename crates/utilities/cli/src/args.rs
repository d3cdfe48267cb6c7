//! Logging flags shared by the blob pool binaries.

use crate::{FileLogConfig, LogConfig, LogFormat, LogRotation};
use clap::{ArgAction, Args};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Global logging arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level (0-5). The number of `-v` flags is the level itself, not an increment:
    /// `-v` error, `-vv` warn, `-vvv` info, `-vvvv` debug, `-vvvvv` trace. Info when absent.
    #[arg(
        short = 'v',
        long = "verbosity",
        action = ArgAction::Count,
        default_value_t = 3,
        global = true
    )]
    pub level: u8,

    /// Suppress logs on stdout.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub stdout_quiet: bool,

    /// Format of the logs written to stdout.
    #[arg(long = "log.stdout.format", default_value = "full", global = true)]
    pub stdout_format: LogFormat,

    /// Directory for log files. File logging is disabled when unset.
    #[arg(long = "log.file.directory", env = "LIMBO_LOG_DIR", global = true)]
    pub file_directory: Option<PathBuf>,

    /// Format of the logs written to files.
    #[arg(long = "log.file.format", default_value = "full", global = true)]
    pub file_format: LogFormat,

    /// How often log files are rotated.
    #[arg(long = "log.file.rotation", default_value = "never", global = true)]
    pub file_rotation: LogRotation,
}

impl Default for LogArgs {
    fn default() -> Self {
        Self {
            level: 3,
            stdout_quiet: false,
            stdout_format: LogFormat::Full,
            file_directory: None,
            file_format: LogFormat::Full,
            file_rotation: LogRotation::Never,
        }
    }
}

impl LogArgs {
    /// Maps the verbosity count onto a [`LevelFilter`].
    pub const fn level_filter(&self) -> LevelFilter {
        match self.level {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

impl From<LogArgs> for LogConfig {
    fn from(args: LogArgs) -> Self {
        Self {
            global_level: args.level_filter(),
            stdout_format: (!args.stdout_quiet).then_some(args.stdout_format),
            file_logs: args.file_directory.map(|directory_path| FileLogConfig {
                directory_path,
                format: args.file_format,
                rotation: args.file_rotation,
            }),
        }
    }
}
