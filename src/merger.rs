//! Chronological merge of harvested records
//!
//! Pure and total: stable ascending sort by timestamp, then first-wins
//! deduplication on the (timestamp, message) pair. Ties on timestamp keep
//! their relative input order since the sources carry no sub-second
//! ordering information.

use crate::record::CommitRecord;
use std::collections::HashSet;

/// Sort and deduplicate the harvested collection
pub fn merge(mut records: Vec<CommitRecord>) -> Vec<CommitRecord> {
    records.sort_by_key(|r| r.timestamp);

    let mut seen: HashSet<(i64, String)> = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert((r.timestamp, r.message.clone())));
    records
}
