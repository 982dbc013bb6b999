/// Value types flowing through the harvest-merge-replay pipeline
use std::path::Path;

/// A single harvested commit, reduced to the metadata that gets mirrored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Author timestamp (Unix epoch seconds), taken verbatim from the source
    pub timestamp: i64,
    /// Final commit message, already labeled and filtered
    pub message: String,
}

impl CommitRecord {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// How the replayer treats existing destination history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Append new commits after the current head
    Incremental,
    /// Discard all destination history and recreate it from scratch
    Rebuild,
}

/// Terminal outcome of a non-preview run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Commits were replayed and the watermark advanced
    Synced {
        /// Number of commits created in the destination
        count: usize,
        /// Timestamp of the last replayed commit (the new watermark)
        newest_timestamp: i64,
    },
    /// Harvest produced no new records; nothing was written anywhere
    NothingToDo,
}

/// Read-only summary produced by preview mode
#[derive(Debug, Clone)]
pub struct PreviewReport {
    /// Watermark in effect for the previewed harvest, if any
    pub watermark: Option<i64>,
    /// Total candidate commits after merge and dedup
    pub candidate_count: usize,
    /// First few records of the would-be replay
    pub head: Vec<CommitRecord>,
    /// Last few records of the would-be replay (empty when head covers all)
    pub tail: Vec<CommitRecord>,
}

/// Derive the short source label from a repository path.
///
/// The label is the final path component, e.g. `/home/me/work/project-x`
/// becomes `project-x`. It prefixes every mirrored subject as
/// `[project-x] <subject>`.
pub fn source_label(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Compose the message handed to the filter: `[label] subject`
pub fn labeled_subject(label: &str, subject: &str) -> String {
    format!("[{}] {}", label, subject.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_source_label_from_path() {
        assert_eq!(source_label(Path::new("/home/me/work/project-x")), "project-x");
        assert_eq!(source_label(Path::new("relative/alpha")), "alpha");
    }

    #[test]
    fn test_source_label_trailing_slash() {
        // file_name ignores a trailing separator
        assert_eq!(source_label(&PathBuf::from("/srv/repos/beta/")), "beta");
    }

    #[test]
    fn test_source_label_degenerate_path() {
        assert_eq!(source_label(Path::new("/")), "unknown");
    }

    #[test]
    fn test_labeled_subject() {
        assert_eq!(labeled_subject("alpha", "fix bug"), "[alpha] fix bug");
    }

    #[test]
    fn test_labeled_subject_trims_subject() {
        assert_eq!(labeled_subject("alpha", "  add feature\n"), "[alpha] add feature");
    }
}
