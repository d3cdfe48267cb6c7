//! Contains subcommands for the limbo tool.

mod inspect;
pub use inspect::{BlockSummary, InspectCommand, LimboSummary};

mod finalize;
pub use finalize::FinalizeCommand;

mod drop;
pub use drop::DropCommand;
