//! End-to-end sync pipeline
//!
//! Control flow: sync state -> harvester (reads watermark) -> merger ->
//! replayer -> sync state (updates watermark). Fully sequential: the
//! destination history is a strictly ordered append log and interleaved
//! commit creation would make timestamp ordering nondeterministic.

use crate::config::Config;
use crate::error::{MirrorError, ReplayError};
use crate::filter;
use crate::fs_lock::DestinationLock;
use crate::git::Replayer;
use crate::harvester::{self, HarvestOptions};
use crate::merger;
use crate::record::{PreviewReport, SyncMode, SyncOutcome};
use crate::state;
use std::time::Instant;

/// Number of records shown at each end of a preview sample
const PREVIEW_SAMPLE: usize = 5;

/// Run a mutating sync (incremental or full rebuild).
///
/// Holds the destination lock for the whole run. The watermark is persisted
/// only after the replay is durably recorded: a push failure surfaces as
/// `DestinationUnreachable` and leaves the previous watermark intact, so the
/// next run re-harvests and dedup prevents double commits.
pub fn run(config: &Config, mode: SyncMode, verbose: bool) -> Result<SyncOutcome, MirrorError> {
    let start = Instant::now();

    let dest_display = config.destination.path.display().to_string();
    let _lock = DestinationLock::try_acquire_path(&config.destination.path)?
        .ok_or_else(|| ReplayError::Locked(dest_display.clone()))?;

    // Pre-flight: an unusable filter fails the run before any harvesting
    let message_filter = filter::from_config(config.filter.command.as_deref());
    message_filter.preflight()?;

    let watermark = match mode {
        SyncMode::Rebuild => {
            tracing::info!("Full rebuild: ignoring persisted watermark");
            None
        }
        SyncMode::Incremental => state::load(&config.state.path)?,
    };

    let harvested = harvester::harvest(
        &config.sources,
        &config.author_email_set(),
        watermark,
        message_filter.as_ref(),
        HarvestOptions {
            verbose,
            require_contributor_match: config.require_contributor_match,
        },
    )?;

    let merged = merger::merge(harvested);
    if merged.is_empty() {
        // A rebuild is a request to make the destination match the harvest,
        // so an empty harvest still discards existing history and state
        if mode == SyncMode::Rebuild {
            let replayer =
                Replayer::open_or_init(&config.destination.path, &config.destination.branch)?;
            replayer.reset(&config.identity.name, &config.identity.email)?;
            if let Some(remote) = &config.destination.remote {
                replayer.push(remote, true)?;
            }
            state::clear(&config.state.path)?;
            tracing::info!("Rebuild with empty harvest: destination history reset");
        } else {
            tracing::info!("Nothing to do: harvest is empty");
        }
        return Ok(SyncOutcome::NothingToDo);
    }

    let replayer = Replayer::open_or_init(&config.destination.path, &config.destination.branch)?;
    let newest = replayer
        .replay(
            &merged,
            &config.identity.name,
            &config.identity.email,
            mode,
        )?
        .ok_or_else(|| MirrorError::other("replay of non-empty input returned no timestamp"))?;

    // Local commits exist now, but the run only counts as durably synced
    // once the remote (when configured) has them
    if let Some(remote) = &config.destination.remote {
        replayer.push(remote, mode == SyncMode::Rebuild)?;
    }

    state::save(&config.state.path, newest)?;

    tracing::info!(
        "Synced {} commits in {:.2?}, watermark now {}",
        merged.len(),
        start.elapsed(),
        newest
    );

    Ok(SyncOutcome::Synced {
        count: merged.len(),
        newest_timestamp: newest,
    })
}

/// Compute what a sync would do, writing nothing anywhere.
///
/// `label_filter` restricts the preview to sources whose label contains the
/// given substring. The watermark is loaded for display only; `state::save`
/// is never called, no lock is taken, and the destination is never opened.
pub fn preview(
    config: &Config,
    label_filter: Option<&str>,
    verbose: bool,
) -> Result<PreviewReport, MirrorError> {
    let message_filter = filter::from_config(config.filter.command.as_deref());
    message_filter.preflight()?;

    let watermark = state::load(&config.state.path)?;

    let sources: Vec<_> = match label_filter {
        Some(needle) => config
            .sources
            .iter()
            .filter(|s| s.effective_label().contains(needle))
            .cloned()
            .collect(),
        None => config.sources.clone(),
    };

    if let Some(needle) = label_filter {
        tracing::info!(
            "Previewing {} of {} sources matching '{}'",
            sources.len(),
            config.sources.len(),
            needle
        );
    }

    let harvested = harvester::harvest(
        &sources,
        &config.author_email_set(),
        watermark,
        message_filter.as_ref(),
        HarvestOptions {
            verbose,
            // Preview never fails on a contributor mismatch; it reports
            require_contributor_match: false,
        },
    )?;

    let merged = merger::merge(harvested);
    let candidate_count = merged.len();

    let (head, tail) = if candidate_count <= PREVIEW_SAMPLE * 2 {
        (merged, Vec::new())
    } else {
        let head = merged[..PREVIEW_SAMPLE].to_vec();
        let tail = merged[candidate_count - PREVIEW_SAMPLE..].to_vec();
        (head, tail)
    };

    Ok(PreviewReport {
        watermark,
        candidate_count,
        head,
        tail,
    })
}
