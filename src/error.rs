/// Centralized error types for commit-mirror using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the mirror pipeline
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Sync state error: {0}")]
    State(#[from] StateError),

    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Errors related to reading source repositories
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Failed to iterate commits: {0}")]
    IterFailed(String),

    #[error("None of the configured author emails appear in: {0}")]
    NoContributorMatch(String),
}

/// Errors related to the external message filter
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter command not found: {0}")]
    NotFound(String),

    #[error("Filter command is not executable: {0}")]
    NotExecutable(String),

    #[error("Filter command failed: {0}")]
    Crashed(String),

    #[error("Filter produced invalid UTF-8 output")]
    InvalidOutput,
}

/// Errors related to the persisted sync watermark
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read state file '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to write state file '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("State file '{path}' is corrupted: {reason}")]
    Corrupted { path: String, reason: String },
}

/// Errors related to replaying into the destination repository
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to open destination repository '{path}': {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to create commit: {0}")]
    CommitFailed(String),

    #[error("Destination unreachable: {0}")]
    DestinationUnreachable(String),

    #[error("Destination repository is locked by another sync process: {0}")]
    Locked(String),
}

// Conversion from anyhow::Error to MirrorError
impl From<anyhow::Error> for MirrorError {
    fn from(err: anyhow::Error) -> Self {
        MirrorError::Other(format!("{:#}", err))
    }
}

impl MirrorError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        MirrorError::Other(msg.into())
    }

    /// Check if this is a user error (bad configuration) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(self, MirrorError::Config(_))
    }

    /// Check if retrying the run unchanged could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MirrorError::Replay(ReplayError::DestinationUnreachable(_))
                | MirrorError::Replay(ReplayError::Locked(_))
                | MirrorError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MirrorError::Git(GitError::NotARepository("/srv/missing".to_string()));
        assert_eq!(
            err.to_string(),
            "Git error: Not a git repository: /srv/missing"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MirrorError = io_err.into();
        assert!(matches!(err, MirrorError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err: MirrorError = anyhow_err.into();
        assert!(matches!(err, MirrorError::Other(_)));
    }

    #[test]
    fn test_filter_unavailable_display() {
        let err = FilterError::NotExecutable("/opt/filter.sh".to_string());
        assert_eq!(
            err.to_string(),
            "Filter command is not executable: /opt/filter.sh"
        );
    }

    #[test]
    fn test_state_error_corrupted() {
        let err = StateError::Corrupted {
            path: "/tmp/last_sync".to_string(),
            reason: "not an integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "State file '/tmp/last_sync' is corrupted: not an integer"
        );
    }

    #[test]
    fn test_is_user_error() {
        let user_err = MirrorError::Config(ConfigError::MissingRequired("identity.email".into()));
        assert!(user_err.is_user_error());

        let system_err =
            MirrorError::Replay(ReplayError::DestinationUnreachable("push refused".into()));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_is_retryable() {
        let retryable = MirrorError::Replay(ReplayError::DestinationUnreachable("timeout".into()));
        assert!(retryable.is_retryable());

        let not_retryable = MirrorError::Filter(FilterError::NotFound("missing".into()));
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_error_chain() {
        let replay_err = ReplayError::CommitFailed("bad tree".to_string());
        let err: MirrorError = replay_err.into();
        assert!(matches!(err, MirrorError::Replay(_)));
        assert_eq!(
            err.to_string(),
            "Replay error: Failed to create commit: bad tree"
        );
    }
}
