/// Configuration system for commit-mirror
///
/// Loaded from a TOML file with priority:
/// CLI args > Environment variables > Config file
use crate::error::{ConfigError, MirrorError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Fixed synthetic identity stamped on every mirrored commit
    pub identity: IdentityConfig,

    /// Destination repository configuration
    pub destination: DestinationConfig,

    /// Source repositories to harvest, in order
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,

    /// Author email addresses that identify the user's commits in the sources
    #[serde(default)]
    pub authors: Vec<String>,

    /// External message filter configuration
    #[serde(default)]
    pub filter: FilterConfig,

    /// Sync state (watermark) configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Treat a source repository with zero matching contributors as an error
    /// instead of a warning
    #[serde(default)]
    pub require_contributor_match: bool,
}

/// Identity used for every replayed commit (author and committer alike)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Commit author/committer name
    pub name: String,
    /// Commit author/committer email
    pub email: String,
}

/// Destination repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Local path of the destination repository
    pub path: PathBuf,

    /// Branch receiving the mirrored commits
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Remote to push after replay; no push when unset
    #[serde(default)]
    pub remote: Option<String>,
}

/// One source repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Repository path; may use `~/` home-directory shorthand
    pub path: PathBuf,

    /// Label prefixed to mirrored subjects; derived from the directory name
    /// when unset
    #[serde(default)]
    pub label: Option<String>,
}

/// External message filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilterConfig {
    /// Executable invoked once per candidate message; passthrough when unset
    #[serde(default)]
    pub command: Option<PathBuf>,
}

/// Sync state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Watermark file path
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

// Default value functions
fn default_branch() -> String {
    "main".to_string()
}

fn default_state_path() -> PathBuf {
    paths::PlatformPaths::default_state_path()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

impl SourceConfig {
    /// Resolved filesystem path with `~` expanded
    pub fn resolved_path(&self) -> PathBuf {
        paths::expand_user(&self.path)
    }

    /// Effective source label (explicit override or directory name)
    pub fn effective_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => crate::record::source_label(&self.resolved_path()),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, MirrorError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path or the platform default location
    pub fn load(explicit: Option<&Path>) -> Result<Self, MirrorError> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => paths::PlatformPaths::default_config_path(),
        };

        tracing::info!("Loading config from: {}", config_path.display());
        let mut config = Self::from_file(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.identity.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("identity.name".to_string()).into());
        }

        if self.identity.email.trim().is_empty() {
            return Err(ConfigError::MissingRequired("identity.email".to_string()).into());
        }

        if self.destination.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("destination.path".to_string()).into());
        }

        if self.destination.branch.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "destination.branch".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.sources.is_empty() {
            return Err(ConfigError::MissingRequired("source (at least one)".to_string()).into());
        }

        if self.authors.is_empty() {
            return Err(ConfigError::MissingRequired("authors (at least one)".to_string()).into());
        }

        for email in &self.authors {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue {
                    key: "authors".to_string(),
                    reason: format!("'{}' does not look like an email address", email),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("COMMIT_MIRROR_DESTINATION") {
            self.destination.path = PathBuf::from(path);
        }

        if let Ok(remote) = std::env::var("COMMIT_MIRROR_REMOTE") {
            self.destination.remote = if remote.is_empty() { None } else { Some(remote) };
        }

        if let Ok(command) = std::env::var("COMMIT_MIRROR_FILTER") {
            self.filter.command = Some(PathBuf::from(command));
        }

        if let Ok(path) = std::env::var("COMMIT_MIRROR_STATE_PATH") {
            self.state.path = PathBuf::from(path);
        }
    }

    /// Author emails as a lookup set (matching is case-insensitive, emails
    /// are normalized to lowercase)
    pub fn author_email_set(&self) -> HashSet<String> {
        self.authors.iter().map(|e| e.to_lowercase()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
            authors = ["me@example.com", "Me@Work.example"]

            [identity]
            name = "Activity Bot"
            email = "bot@example.com"

            [destination]
            path = "/srv/activity-mirror"
            remote = "origin"

            [[source]]
            path = "~/work/project-x"

            [[source]]
            path = "/srv/repos/alpha"
            label = "alpha-core"

            [filter]
            command = "/usr/local/bin/scrub-subject"
        "#
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(sample_toml()).unwrap();
        assert_eq!(config.identity.name, "Activity Bot");
        assert_eq!(config.destination.branch, "main");
        assert_eq!(config.destination.remote.as_deref(), Some("origin"));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].effective_label(), "alpha-core");
        assert!(config.filter.command.is_some());
        assert!(!config.require_contributor_match);
        config.validate().unwrap();
    }

    #[test]
    fn test_label_derived_from_path() {
        let config: Config = toml::from_str(sample_toml()).unwrap();
        assert_eq!(config.sources[0].effective_label(), "project-x");
    }

    #[test]
    fn test_author_email_set_lowercased() {
        let config: Config = toml::from_str(sample_toml()).unwrap();
        let emails = config.author_email_set();
        assert!(emails.contains("me@example.com"));
        assert!(emails.contains("me@work.example"));
    }

    #[test]
    fn test_state_path_defaults() {
        let config: Config = toml::from_str(sample_toml()).unwrap();
        assert!(config.state.path.ends_with("last_sync"));
    }

    #[test]
    fn test_validate_rejects_missing_sources() {
        let mut config: Config = toml::from_str(sample_toml()).unwrap();
        config.sources.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_authors() {
        let mut config: Config = toml::from_str(sample_toml()).unwrap();
        config.authors.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut config: Config = toml::from_str(sample_toml()).unwrap();
        config.authors = vec!["not-an-email".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_identity() {
        let mut config: Config = toml::from_str(sample_toml()).unwrap();
        config.identity.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let err = Config::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(
            err,
            MirrorError::Config(ConfigError::FileNotFound(_))
        ));
    }
}
