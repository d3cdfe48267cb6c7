//! [tracing_subscriber] utilities.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::MakeWriter,
    prelude::__tracing_subscriber_SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
};

/// Name of the log file inside the configured log directory.
const LOG_FILE_NAME: &str = "limbo.log";

/// The format of the logs.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogFormat {
    /// Full format (default).
    #[default]
    Full,
    /// JSON format.
    Json,
    /// Pretty format.
    Pretty,
    /// Compact format.
    Compact,
}

/// How often file logs are rotated.
#[derive(
    Default, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate every minute.
    Minutely,
    /// Rotate every hour.
    Hourly,
    /// Rotate every day.
    Daily,
    /// Never rotate (default).
    #[default]
    Never,
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Directory the log files are written to.
    pub directory_path: PathBuf,
    /// Format of the file logs.
    pub format: LogFormat,
    /// Rotation policy of the file logs.
    pub rotation: LogRotation,
}

/// Logging configuration of a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Most verbose level emitted by any layer.
    pub global_level: LevelFilter,
    /// Format of the stdout logs, `None` disables stdout logging.
    pub stdout_format: Option<LogFormat>,
    /// File logging, `None` disables it.
    pub file_logs: Option<FileLogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global_level: LevelFilter::INFO,
            stdout_format: Some(LogFormat::Full),
            file_logs: None,
        }
    }
}

impl LogConfig {
    /// Initializes the global tracing subscriber.
    ///
    /// # Arguments
    /// * `env_filter` - Optional environment filter. Defaults to `RUST_LOG`.
    ///
    /// # Returns
    /// * `Err(TryInitError)` if a global subscriber is already installed.
    pub fn init_tracing_subscriber(
        &self,
        env_filter: Option<EnvFilter>,
    ) -> Result<(), TryInitError> {
        let file_layer = self.file_logs.as_ref().map(|file_logs| {
            let directory_path = file_logs.directory_path.clone();
            let appender = match file_logs.rotation {
                LogRotation::Minutely => {
                    tracing_appender::rolling::minutely(directory_path, LOG_FILE_NAME)
                }
                LogRotation::Hourly => tracing_appender::rolling::hourly(directory_path, LOG_FILE_NAME),
                LogRotation::Daily => tracing_appender::rolling::daily(directory_path, LOG_FILE_NAME),
                LogRotation::Never => tracing_appender::rolling::never(directory_path, LOG_FILE_NAME),
            };
            format_layer(file_logs.format, appender)
        });

        let stdout_layer = self.stdout_format.map(|format| format_layer(format, std::io::stdout));

        let env_filter = env_filter
            .unwrap_or_else(EnvFilter::from_default_env)
            .add_directive(self.global_level.into());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stdout_layer)
            .try_init()
    }
}

fn format_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    match format {
        LogFormat::Full => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Installs a subscriber for tests, ignoring the error if one is already set.
pub fn init_test_tracing() {
    let config = LogConfig { global_level: LevelFilter::DEBUG, ..Default::default() };
    let _ = config.init_tracing_subscriber(None);
}
