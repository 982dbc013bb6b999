//! Filesystem-based locking for cross-process coordination
//!
//! The destination repository's working copy is the one resource needing
//! exclusive access during replay. An flock() on a per-destination lock file
//! keeps a second sync process from interleaving commits; if the process
//! crashes, the OS releases the lock automatically.

use anyhow::{Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Get the directory for lock files
fn lock_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commit-mirror")
        .join("locks")
}

/// Get the lock file path for a given normalized destination path
fn lock_file_path(normalized_path: &str) -> PathBuf {
    // Hash the path to create a safe filename
    let mut hasher = Sha256::new();
    hasher.update(normalized_path.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    // Use first 16 chars of hash for brevity while maintaining uniqueness
    lock_dir().join(format!("{}.lock", &hash[..16]))
}

/// Guard that holds an exclusive filesystem lock on a destination repository
///
/// The lock is released when this guard is dropped.
pub struct DestinationLock {
    _file: File,
    _path: PathBuf,
}

impl DestinationLock {
    /// Try to acquire the lock for a destination path, non-blocking.
    ///
    /// The path is canonicalized first so different spellings of the same
    /// directory (relative vs absolute, via a symlink) contend on one lock
    /// file. A path that does not exist yet is used as given.
    pub fn try_acquire_path(path: &Path) -> Result<Option<Self>> {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self::try_acquire(&canonical.to_string_lossy())
    }

    /// Try to acquire an exclusive filesystem lock, non-blocking
    ///
    /// Returns:
    /// - `Ok(Some(guard))` if the lock was acquired
    /// - `Ok(None)` if another process holds the lock
    /// - `Err(...)` on IO errors
    pub fn try_acquire(normalized_path: &str) -> Result<Option<Self>> {
        let lock_path = lock_file_path(normalized_path);

        tracing::debug!(
            "Attempting to acquire destination lock: path={}, lock_file={:?}",
            normalized_path,
            lock_path
        );

        // Ensure lock directory exists
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).context("Failed to create lock directory")?;
        }

        // Open/create lock file
        let file = File::create(&lock_path).context("Failed to create lock file")?;

        // Try non-blocking exclusive lock
        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(
                    "Acquired destination lock for: {} (lock_file={:?})",
                    normalized_path,
                    lock_path
                );
                Ok(Some(Self {
                    _file: file,
                    _path: lock_path,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!(
                    "Destination lock blocked (another holder) for: {} (lock_file={:?})",
                    normalized_path,
                    lock_path
                );
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to acquire destination lock"),
        }
    }
}

impl Drop for DestinationLock {
    fn drop(&mut self) {
        // The lock is released when the file is closed; the lock file itself
        // stays on disk for reuse
        tracing::debug!("Releasing destination lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let path = "/test/destination/for/locking";

        // Acquire lock
        let guard = DestinationLock::try_acquire(path).unwrap();
        assert!(guard.is_some());

        // Drop to release
        drop(guard);

        // Should be able to acquire again
        let guard2 = DestinationLock::try_acquire(path).unwrap();
        assert!(guard2.is_some());
    }

    #[test]
    fn test_concurrent_lock_fails() {
        let path = "/test/destination/for/concurrent/locking";

        // Acquire lock in main thread
        let guard1 = DestinationLock::try_acquire(path).unwrap();
        assert!(guard1.is_some());

        // Try to acquire from another thread - should fail
        let path_clone = path.to_string();
        let handle = thread::spawn(move || DestinationLock::try_acquire(&path_clone).unwrap());

        let result = handle.join().unwrap();
        assert!(result.is_none(), "Second lock should fail");

        // Release first lock
        drop(guard1);

        // Now acquiring should succeed again
        let guard2 = DestinationLock::try_acquire(path).unwrap();
        assert!(guard2.is_some());
    }

    #[test]
    fn test_equivalent_path_spellings_contend_on_one_lock() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let roundabout = dir.path().join("sub").join("..");

        let guard = DestinationLock::try_acquire_path(dir.path()).unwrap();
        assert!(guard.is_some());

        // Same directory reached through a different spelling must block
        let blocked = DestinationLock::try_acquire_path(&roundabout).unwrap();
        assert!(blocked.is_none());
    }

    #[test]
    fn test_lock_file_path_uniqueness() {
        let path1 = "/path/to/dest1";
        let path2 = "/path/to/dest2";
        let path1_dup = "/path/to/dest1";

        let lock1 = lock_file_path(path1);
        let lock2 = lock_file_path(path2);
        let lock1_dup = lock_file_path(path1_dup);

        assert_ne!(lock1, lock2, "Different paths should have different lock files");
        assert_eq!(lock1, lock1_dup, "Same path should have same lock file");
    }
}
