use crate::error::GitError;
use git2::{Repository, Revwalk, Sort};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// A raw log entry as read from a source repository: author timestamp plus
/// the one-line subject. No body, no diff, no author identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    /// Author timestamp (Unix epoch seconds)
    pub timestamp: i64,
    /// First line of the commit message
    pub subject: String,
}

/// Reader over one source repository's commit log
pub struct LogReader {
    repo: Repository,
    repo_path: PathBuf,
}

impl std::fmt::Debug for LogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogReader")
            .field("repo_path", &self.repo_path)
            .finish_non_exhaustive()
    }
}

impl LogReader {
    /// Open a source repository, failing with `NotARepository` when the path
    /// is not a valid git root. Callers treat that as skip-and-warn.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .map_err(|_| GitError::NotARepository(path.display().to_string()))?;

        tracing::debug!("Opened source repository at: {}", path.display());

        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Lazy walk over commits authored by any of the given emails, bounded
    /// below by an exclusive watermark.
    ///
    /// The walk runs oldest-first in commit-time order; the yielded records
    /// carry author timestamps, which can interleave differently after a
    /// rebase. Global author-time ordering is the merge step's job, not
    /// this reader's.
    ///
    /// Emails in the set must be lowercase; matching is case-insensitive.
    /// With `since_exclusive = Some(w)` only commits with `timestamp > w`
    /// are yielded, so the boundary commit of a previous run never recurs.
    pub fn commits<'repo>(
        &'repo self,
        author_emails: &'repo HashSet<String>,
        since_exclusive: Option<i64>,
    ) -> Result<CommitIter<'repo>, GitError> {
        // An unborn HEAD means an empty repository, which yields nothing
        let revwalk = if self.repo.head().is_ok() {
            let mut revwalk = self
                .repo
                .revwalk()
                .map_err(|e| GitError::IterFailed(e.to_string()))?;
            revwalk
                .set_sorting(Sort::TIME | Sort::REVERSE)
                .map_err(|e| GitError::IterFailed(e.to_string()))?;
            revwalk
                .push_head()
                .map_err(|e| GitError::IterFailed(e.to_string()))?;
            Some(revwalk)
        } else {
            tracing::debug!(
                "Source repository has no commits: {}",
                self.repo_path.display()
            );
            None
        };

        Ok(CommitIter {
            repo: &self.repo,
            revwalk,
            author_emails,
            since_exclusive,
        })
    }

    /// Distinct author emails across the full history, sorted.
    ///
    /// Purely diagnostic: helps a user answer "why did I get zero commits"
    /// when the configured emails do not match anything.
    pub fn contributor_emails(&self) -> Result<Vec<String>, GitError> {
        let mut emails = BTreeSet::new();

        if self.repo.head().is_err() {
            return Ok(Vec::new());
        }

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::IterFailed(e.to_string()))?;
        revwalk
            .push_head()
            .map_err(|e| GitError::IterFailed(e.to_string()))?;

        for oid in revwalk {
            let oid = oid.map_err(|e| GitError::IterFailed(e.to_string()))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::IterFailed(e.to_string()))?;
            if let Some(email) = commit.author().email() {
                emails.insert(email.to_lowercase());
            }
        }

        Ok(emails.into_iter().collect())
    }

    /// Whether any of the given (lowercase) emails authored a commit here
    pub fn has_matching_author(&self, author_emails: &HashSet<String>) -> Result<bool, GitError> {
        Ok(self
            .contributor_emails()?
            .iter()
            .any(|email| author_emails.contains(email)))
    }
}

/// Lazy iterator over matching commits, oldest first by commit time.
///
/// One walk covers all configured author emails at once; git2 revwalks have
/// no single-author restriction, so there is no per-email query loop and no
/// cross-email duplicate to remove (a commit has exactly one author).
pub struct CommitIter<'repo> {
    repo: &'repo Repository,
    revwalk: Option<Revwalk<'repo>>,
    author_emails: &'repo HashSet<String>,
    since_exclusive: Option<i64>,
}

impl Iterator for CommitIter<'_> {
    type Item = Result<RawCommit, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let revwalk = self.revwalk.as_mut()?;

        for oid in revwalk {
            let oid = match oid {
                Ok(oid) => oid,
                Err(e) => return Some(Err(GitError::IterFailed(e.to_string()))),
            };

            let commit = match self.repo.find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => return Some(Err(GitError::IterFailed(e.to_string()))),
            };

            let timestamp = commit.author().when().seconds();
            if let Some(since) = self.since_exclusive
                && timestamp <= since
            {
                continue;
            }

            let matches = commit
                .author()
                .email()
                .map(|email| self.author_emails.contains(&email.to_lowercase()))
                .unwrap_or(false);
            if !matches {
                continue;
            }

            let subject = commit.summary().unwrap_or("").to_string();
            return Some(Ok(RawCommit { timestamp, subject }));
        }

        None
    }
}
