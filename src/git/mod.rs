//! Git plumbing for the mirror pipeline
//!
//! Treats source repositories as an opaque versioned-log data source and the
//! destination repository as an opaque append-only commit sink.

/// Source repository log reading with author filtering
pub mod reader;
/// Empty-commit replay into the destination repository
pub mod replayer;

pub use reader::{CommitIter, LogReader, RawCommit};
pub use replayer::Replayer;
