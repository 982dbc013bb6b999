use crate::error::ReplayError;
use crate::record::{CommitRecord, SyncMode};
use git2::{Commit, Oid, Repository, Signature, Time};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Message of the root commit created by a full rebuild
const INIT_MESSAGE: &str = "Initialize activity mirror";

/// Append-only commit sink over the destination repository.
///
/// Every record becomes exactly one empty commit: the tree is the parent's
/// tree (or the empty tree for a root commit), author and committer are the
/// fixed configured identity, and author date = committer date = the record
/// timestamp. Source author identity never reaches the destination.
pub struct Replayer {
    repo: Repository,
    repo_path: PathBuf,
    branch: String,
}

impl Replayer {
    /// Open the destination repository, initializing a fresh one when the
    /// path holds no repository yet. HEAD is pointed at the configured
    /// branch either way.
    pub fn open_or_init(path: &Path, branch: &str) -> Result<Self, ReplayError> {
        let repo = match Repository::open(path) {
            Ok(repo) => repo,
            Err(_) => {
                tracing::info!(
                    "No repository at {}, initializing destination",
                    path.display()
                );
                let mut opts = git2::RepositoryInitOptions::new();
                opts.initial_head(branch);
                Repository::init_opts(path, &opts).map_err(|e| ReplayError::OpenFailed {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        repo.set_head(&format!("refs/heads/{}", branch))
            .map_err(|e| ReplayError::OpenFailed {
                path: path.display().to_string(),
                reason: format!("cannot select branch '{}': {}", branch, e),
            })?;

        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
            branch: branch.to_string(),
        })
    }

    /// Get the destination repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Replay the ordered, deduplicated records into the destination.
    ///
    /// `Rebuild` discards the existing branch history and starts over from a
    /// fresh initialization commit; `Incremental` appends after the current
    /// head without touching existing commits. In incremental mode a record
    /// whose (timestamp, message) pair is already present in the branch
    /// history is skipped, so resuming after an interrupted run (commits
    /// created, push failed, watermark not saved) never duplicates them.
    /// Returns the timestamp of the last record, or `None` when the input is
    /// empty (no commit is created and the watermark must not move).
    pub fn replay(
        &self,
        records: &[CommitRecord],
        identity_name: &str,
        identity_email: &str,
        mode: SyncMode,
    ) -> Result<Option<i64>, ReplayError> {
        if records.is_empty() {
            return Ok(None);
        }

        let existing = match mode {
            SyncMode::Rebuild => {
                self.reset(identity_name, identity_email)?;
                HashSet::new()
            }
            SyncMode::Incremental => self.existing_records()?,
        };

        let mut applied = 0usize;
        for record in records {
            if existing.contains(&(record.timestamp, record.message.clone())) {
                tracing::debug!(
                    "Skipping record at {}: already in destination history",
                    record.timestamp
                );
                continue;
            }
            self.apply_record(record, identity_name, identity_email)?;
            applied += 1;
            if applied % 100 == 0 {
                tracing::debug!("Replayed {} commits", applied);
            }
        }

        let newest = records.last().map(|r| r.timestamp);
        tracing::info!(
            "Replayed {} commits ({} already present) into {} (branch {})",
            applied,
            records.len() - applied,
            self.repo_path.display(),
            self.branch
        );
        Ok(newest)
    }

    /// Push the branch to the given remote.
    ///
    /// A replay is only durably recorded once this succeeds; the caller must
    /// not advance the watermark when it fails, even though local commits
    /// already exist (the next run re-harvests the same records and `replay`
    /// skips them against the destination history).
    pub fn push(&self, remote_name: &str, force: bool) -> Result<(), ReplayError> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|e| ReplayError::DestinationUnreachable(format!(
                "remote '{}' not found: {}",
                remote_name, e
            )))?;

        let prefix = if force { "+" } else { "" };
        let refspec = format!(
            "{}refs/heads/{branch}:refs/heads/{branch}",
            prefix,
            branch = self.branch
        );

        tracing::info!("Pushing {} to remote '{}'", refspec, remote_name);
        remote
            .push(&[refspec.as_str()], None)
            .map_err(|e| ReplayError::DestinationUnreachable(format!(
                "push to '{}' failed: {}",
                remote_name, e
            )))?;

        Ok(())
    }

    /// Discard the branch history and write a fresh root initialization
    /// commit, stamped with the wall-clock time of the rebuild.
    pub fn reset(&self, name: &str, email: &str) -> Result<(), ReplayError> {
        let sig = Signature::now(name, email)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;
        let tree_oid = self.empty_tree()?;
        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        // Root commit with no parents; the branch ref is then force-moved to
        // it, abandoning the old history
        let oid = self
            .repo
            .commit(None, &sig, &sig, INIT_MESSAGE, &tree, &[])
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        let refname = format!("refs/heads/{}", self.branch);
        self.repo
            .reference(&refname, oid, true, "commit-mirror rebuild")
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;
        self.repo
            .set_head(&refname)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        tracing::info!("Destination history reset, new root {}", oid);
        Ok(())
    }

    /// Create one empty commit for a record
    fn apply_record(
        &self,
        record: &CommitRecord,
        name: &str,
        email: &str,
    ) -> Result<Oid, ReplayError> {
        let when = Time::new(record.timestamp, 0);
        let sig = Signature::new(name, email, &when)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        let parent = self.head_commit();
        let tree_oid = match &parent {
            Some(parent) => parent.tree_id(),
            None => self.empty_tree()?,
        };
        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        let parents: Vec<&Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, &record.message, &tree, &parents)
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))
    }

    /// (author timestamp, message) pairs already reachable from the branch
    /// head. Used to skip records a previous interrupted run already applied.
    fn existing_records(&self) -> Result<HashSet<(i64, String)>, ReplayError> {
        let mut existing = HashSet::new();

        if self.repo.head().is_err() {
            return Ok(existing);
        }

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;
        revwalk
            .push_head()
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;

        for oid in revwalk {
            let oid = oid.map_err(|e| ReplayError::CommitFailed(e.to_string()))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| ReplayError::CommitFailed(e.to_string()))?;
            existing.insert((
                commit.author().when().seconds(),
                commit.message().unwrap_or("").to_string(),
            ));
        }

        Ok(existing)
    }

    fn head_commit(&self) -> Option<Commit<'_>> {
        self.repo.head().ok().and_then(|h| h.peel_to_commit().ok())
    }

    fn empty_tree(&self) -> Result<Oid, ReplayError> {
        self.repo
            .treebuilder(None)
            .and_then(|builder| builder.write())
            .map_err(|e| ReplayError::CommitFailed(e.to_string()))
    }
}
