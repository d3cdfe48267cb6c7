#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod args;
pub use args::LogArgs;

mod logs;
pub use logs::{FileLogConfig, LogConfig, LogFormat, LogRotation, init_test_tracing};
