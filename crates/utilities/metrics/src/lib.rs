#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod call;
pub use call::CallMetrics;

mod reporter;
pub use reporter::MetricsReporter;
