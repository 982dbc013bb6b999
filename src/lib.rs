//! # commit-mirror - Private Activity, Public Timeline
//!
//! Synchronizes commit *metadata* (timestamps and subjects) from local
//! private repositories into a destination repository as empty commits, so
//! that a public activity timeline exists without exposing any source code.
//!
//! ## Pipeline
//!
//! ```text
//! sync state ──▶ harvester ──▶ merger ──▶ replayer ──▶ sync state
//!  (watermark)     │  ▲        (dedupe      (empty       (new
//!                  │  │         + sort)      commits)     watermark)
//!           reader ┘  └ filter
//!           (per source repo)
//! ```
//!
//! The harvester reads each configured source repository's log for commits
//! authored by the configured emails, prefixes every subject with a source
//! label (`[project-x] fix bug`) and passes it through a pluggable message
//! filter that can sanitize or drop it. The merger orders the surviving
//! records chronologically and removes duplicates, and the replayer turns
//! each record into one empty commit in the destination, stamped with the
//! original timestamp and a fixed synthetic identity. A persisted watermark
//! makes re-runs incremental and interruption-safe.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with environment variable overrides
//! - [`filter`]: pluggable message filter (external command or passthrough)
//! - [`git`]: log reading from sources, empty-commit replay into the destination
//! - [`harvester`]: per-source harvest orchestration
//! - [`merger`]: chronological merge and deduplication
//! - [`pipeline`]: end-to-end sync, rebuild, and preview entry points
//! - [`state`]: persisted watermark
//! - [`fs_lock`]: cross-process destination lock
//! - [`record`]: value types flowing through the pipeline
//! - [`error`]: error types and utilities
//! - [`paths`]: platform path resolution and `~` expansion

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Pluggable message filter interface and implementations
pub mod filter;

/// Cross-process lock on the destination repository
pub mod fs_lock;

/// Git log reading and empty-commit replay
pub mod git;

/// Harvest orchestration across source repositories
pub mod harvester;

/// Chronological merge and deduplication
pub mod merger;

/// Path normalization and platform defaults
pub mod paths;

/// End-to-end pipeline entry points
pub mod pipeline;

/// Value types flowing through the pipeline
pub mod record;

/// Persisted sync watermark
pub mod state;
