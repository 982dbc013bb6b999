//! Harvest candidate commits from all configured source repositories
//!
//! Drives the log reader and the message filter per source, accumulating the
//! surviving records. Order across repositories is whatever the configured
//! source order yields; the merger owns global ordering.

use crate::config::SourceConfig;
use crate::error::{GitError, MirrorError};
use crate::filter::{FilterVerdict, MessageFilter};
use crate::git::LogReader;
use crate::record::{labeled_subject, CommitRecord};
use std::collections::HashSet;

/// Knobs affecting harvest behavior but not harvest semantics
#[derive(Debug, Clone, Copy, Default)]
pub struct HarvestOptions {
    /// Report each repository's distinct contributor emails
    pub verbose: bool,
    /// Fail when none of the configured emails authored anything in a repo
    pub require_contributor_match: bool,
}

/// Harvest (timestamp, message) pairs from every source repository.
///
/// An invalid source path is skipped with a warning and never aborts the
/// run. Within one repository records come out in the reader's walk order;
/// the result as a whole is unsorted until merged.
pub fn harvest(
    sources: &[SourceConfig],
    author_emails: &HashSet<String>,
    watermark: Option<i64>,
    filter: &dyn MessageFilter,
    options: HarvestOptions,
) -> Result<Vec<CommitRecord>, MirrorError> {
    let mut records = Vec::new();

    for source in sources {
        let path = source.resolved_path();
        let label = source.effective_label();

        let reader = match LogReader::open(&path) {
            Ok(reader) => reader,
            Err(err @ GitError::NotARepository(_)) => {
                tracing::warn!("Skipping source '{}': {}", label, err);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        if options.verbose {
            match reader.contributor_emails() {
                Ok(emails) => tracing::info!(
                    "Source '{}' contributors: {}",
                    label,
                    emails.join(", ")
                ),
                Err(err) => tracing::warn!(
                    "Could not list contributors for '{}': {}",
                    label,
                    err
                ),
            }
        }

        let mut harvested = 0usize;
        for raw in reader.commits(author_emails, watermark)? {
            let raw = raw?;
            let candidate = labeled_subject(&label, &raw.subject);
            match filter.transform(&candidate)? {
                FilterVerdict::Keep(message) => {
                    records.push(CommitRecord::new(raw.timestamp, message));
                    harvested += 1;
                }
                FilterVerdict::Skip => {
                    tracing::debug!("Filter skipped commit at {}", raw.timestamp);
                }
            }
        }

        tracing::info!("Harvested {} commits from '{}'", harvested, label);

        // A repo with zero matches may be legitimate (all commits already
        // synced) or a misconfiguration; tell them apart via the contributor
        // set
        if harvested == 0 && !reader.has_matching_author(author_emails)? {
            let err = GitError::NoContributorMatch(path.display().to_string());
            if options.require_contributor_match {
                return Err(err.into());
            }
            tracing::warn!("{} (configured emails may be wrong)", err);
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Passthrough;
    use git2::{Repository, Signature, Time};
    use std::path::Path;
    use tempfile::TempDir;

    fn add_commit(repo: &Repository, email: &str, subject: &str, timestamp: i64) {
        let sig = Signature::new("Someone", email, &Time::new(timestamp, 0)).unwrap();
        let tree_oid = repo.treebuilder(None).unwrap().write().unwrap();
        let tree = repo.find_tree(tree_oid).unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, subject, &tree, &parent_refs)
            .unwrap();
    }

    fn make_source(root: &Path, name: &str, commits: &[(&str, &str, i64)]) -> SourceConfig {
        let path = root.join(name);
        let repo = Repository::init(&path).unwrap();
        for (email, subject, ts) in commits {
            add_commit(&repo, email, subject, *ts);
        }
        SourceConfig { path, label: None }
    }

    fn emails(addrs: &[&str]) -> HashSet<String> {
        addrs.iter().map(|a| a.to_lowercase()).collect()
    }

    struct SkipAll;

    impl MessageFilter for SkipAll {
        fn transform(&self, _message: &str) -> Result<FilterVerdict, crate::error::FilterError> {
            Ok(FilterVerdict::Skip)
        }
    }

    #[test]
    fn test_harvest_labels_and_orders_within_repo() {
        let dir = TempDir::new().unwrap();
        let source = make_source(
            dir.path(),
            "alpha",
            &[
                ("me@example.com", "fix bug", 100),
                ("me@example.com", "add feature", 200),
            ],
        );

        let records = harvest(
            &[source],
            &emails(&["me@example.com"]),
            None,
            &Passthrough,
            HarvestOptions::default(),
        )
        .unwrap();

        assert_eq!(
            records,
            vec![
                CommitRecord::new(100, "[alpha] fix bug"),
                CommitRecord::new(200, "[alpha] add feature"),
            ]
        );
    }

    #[test]
    fn test_harvest_skips_invalid_source() {
        let dir = TempDir::new().unwrap();
        let valid = make_source(dir.path(), "alpha", &[("me@example.com", "fix bug", 100)]);
        let invalid = SourceConfig {
            path: dir.path().join("not-a-repo"),
            label: None,
        };

        let records = harvest(
            &[invalid, valid],
            &emails(&["me@example.com"]),
            None,
            &Passthrough,
            HarvestOptions::default(),
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "[alpha] fix bug");
    }

    #[test]
    fn test_harvest_respects_watermark() {
        let dir = TempDir::new().unwrap();
        let source = make_source(
            dir.path(),
            "alpha",
            &[
                ("me@example.com", "old", 100),
                ("me@example.com", "new", 300),
            ],
        );

        let records = harvest(
            &[source],
            &emails(&["me@example.com"]),
            Some(100),
            &Passthrough,
            HarvestOptions::default(),
        )
        .unwrap();

        assert_eq!(records, vec![CommitRecord::new(300, "[alpha] new")]);
    }

    #[test]
    fn test_harvest_skip_all_filter_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let source = make_source(dir.path(), "alpha", &[("me@example.com", "secret", 100)]);

        let records = harvest(
            &[source],
            &emails(&["me@example.com"]),
            None,
            &SkipAll,
            HarvestOptions::default(),
        )
        .unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_harvest_contributor_mismatch_warns_by_default() {
        let dir = TempDir::new().unwrap();
        let source = make_source(dir.path(), "alpha", &[("other@example.com", "theirs", 100)]);

        let records = harvest(
            &[source],
            &emails(&["me@example.com"]),
            None,
            &Passthrough,
            HarvestOptions::default(),
        )
        .unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_harvest_contributor_mismatch_errors_when_required() {
        let dir = TempDir::new().unwrap();
        let source = make_source(dir.path(), "alpha", &[("other@example.com", "theirs", 100)]);

        let err = harvest(
            &[source],
            &emails(&["me@example.com"]),
            None,
            &Passthrough,
            HarvestOptions {
                require_contributor_match: true,
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(
            err,
            MirrorError::Git(GitError::NoContributorMatch(_))
        ));
    }

    #[test]
    fn test_harvest_label_override() {
        let dir = TempDir::new().unwrap();
        let mut source = make_source(dir.path(), "alpha", &[("me@example.com", "fix", 100)]);
        source.label = Some("alpha-core".to_string());

        let records = harvest(
            &[source],
            &emails(&["me@example.com"]),
            None,
            &Passthrough,
            HarvestOptions::default(),
        )
        .unwrap();

        assert_eq!(records[0].message, "[alpha-core] fix");
    }
}
