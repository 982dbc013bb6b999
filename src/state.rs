//! Persisted sync watermark
//!
//! A single integer (epoch seconds): the author timestamp of the last
//! successfully replayed commit. Absence of the file means no prior sync.
//! The pipeline loads it once at start and saves it once, only after the
//! destination was durably updated.

use crate::error::StateError;
use std::fs;
use std::path::Path;

/// Read the persisted watermark, `None` when no prior successful run exists
pub fn load(path: &Path) -> Result<Option<i64>, StateError> {
    if !path.exists() {
        tracing::debug!("No state file at {}, first sync", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| StateError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let watermark = content
        .trim()
        .parse::<i64>()
        .map_err(|e| StateError::Corrupted {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!("Loaded watermark {} from {}", watermark, path.display());
    Ok(Some(watermark))
}

/// Persist a new watermark, creating parent directories as needed
pub fn save(path: &Path, watermark: i64) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StateError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    fs::write(path, format!("{}\n", watermark)).map_err(|e| StateError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    tracing::debug!("Saved watermark {} to {}", watermark, path.display());
    Ok(())
}

/// Remove the persisted watermark. A missing file is not an error.
pub fn clear(path: &Path) -> Result<(), StateError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Cleared watermark at {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StateError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}
