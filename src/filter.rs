//! Pluggable message filter
//!
//! The harvester hands every candidate message (`[label] subject`) to a
//! single-purpose transformer that either returns a sanitized replacement or
//! signals skip. The default out-of-process mechanism is a subprocess
//! receiving the message on stdin and writing the result to stdout; an
//! empty-after-trim result means skip.

use crate::error::FilterError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Result of one filter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Mirror the commit with this message
    Keep(String),
    /// Drop the commit entirely
    Skip,
}

/// Single-message-in, single-result-out transformation seam.
///
/// The harvester invokes `transform` exactly once per candidate commit and
/// never retries. `preflight` runs once before any harvesting; an unusable
/// filter fails the whole run there rather than mid-harvest.
pub trait MessageFilter {
    /// Transform one candidate message, or signal skip
    fn transform(&self, message: &str) -> Result<FilterVerdict, FilterError>;

    /// Verify the filter is usable before the run starts
    fn preflight(&self) -> Result<(), FilterError> {
        Ok(())
    }
}

/// Identity filter used when no command is configured
pub struct Passthrough;

impl MessageFilter for Passthrough {
    fn transform(&self, message: &str) -> Result<FilterVerdict, FilterError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Ok(FilterVerdict::Skip);
        }
        Ok(FilterVerdict::Keep(trimmed.to_string()))
    }
}

/// Filter backed by an external executable.
///
/// Contract: message on stdin, sanitized message on stdout, exit code 0.
/// Empty stdout (after trim) skips the commit. A spawn failure, non-zero
/// exit, or non-UTF-8 output aborts the run.
pub struct CommandFilter {
    program: PathBuf,
}

impl CommandFilter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl MessageFilter for CommandFilter {
    fn transform(&self, message: &str) -> Result<FilterVerdict, FilterError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FilterError::Crashed(format!(
                "failed to spawn {}: {}",
                self.program.display(),
                e
            )))?;

        // stdin is piped, so take() cannot fail here
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.as_bytes())
                .map_err(|e| FilterError::Crashed(format!("failed to write message: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| FilterError::Crashed(e.to_string()))?;

        if !output.status.success() {
            return Err(FilterError::Crashed(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            )));
        }

        let text = String::from_utf8(output.stdout).map_err(|_| FilterError::InvalidOutput)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Ok(FilterVerdict::Skip)
        } else {
            Ok(FilterVerdict::Keep(trimmed.to_string()))
        }
    }

    fn preflight(&self) -> Result<(), FilterError> {
        let metadata = std::fs::metadata(&self.program)
            .map_err(|_| FilterError::NotFound(self.program.display().to_string()))?;

        if !metadata.is_file() {
            return Err(FilterError::NotFound(self.program.display().to_string()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(FilterError::NotExecutable(
                    self.program.display().to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Build the configured filter: the external command when one is set,
/// passthrough otherwise
pub fn from_config(command: Option<&Path>) -> Box<dyn MessageFilter> {
    match command {
        Some(program) => Box::new(CommandFilter::new(program)),
        None => Box::new(Passthrough),
    }
}
