// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recent-poll listing entries.

use crate::{kind, EventId, Record, Timestamp};

/// Maximum title length (in characters) before truncation.
pub const TITLE_MAX_CHARS: usize = 100;

/// One row of the recent-polls listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Poll record id.
    pub id: EventId,
    /// Question, truncated to [`TITLE_MAX_CHARS`] with a trailing `...`.
    pub title: String,
    /// Poll creation time.
    pub created_at: Timestamp,
}

impl ListingEntry {
    /// Build a row from a poll record.
    pub fn from_record(record: &Record) -> Self {
        let mut chars = record.content.chars();
        let mut title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
        if chars.next().is_some() {
            title.push_str("...");
        }
        Self {
            id: record.id.clone(),
            title,
            created_at: record.created_at,
        }
    }
}

/// Newest-first listing of at most `max` poll records.
///
/// Equal timestamps are ordered by id so the result does not depend on the
/// order records arrived in. Non-poll records are skipped.
pub fn recent_polls<'a, I>(records: I, max: usize) -> Vec<ListingEntry>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut polls: Vec<&Record> = records
        .into_iter()
        .filter(|r| r.kind == kind::POLL)
        .collect();
    polls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    polls
        .into_iter()
        .take(max)
        .map(ListingEntry::from_record)
        .collect()
}
