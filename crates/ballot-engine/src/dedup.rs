// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-session record deduplication keyed by record id.

use std::collections::HashSet;

use ballot_proto::{EventId, Record};

/// Remembers every record id admitted during one collection session.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<EventId>,
}

impl Deduplicator {
    /// Empty deduplicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `id` is offered, `false` afterwards.
    pub fn admit(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_owned());
        true
    }

    /// Number of distinct ids seen.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// True when nothing has been admitted.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Keep the first occurrence of every id, preserving arrival order.
    pub fn unique<I>(records: I) -> Vec<Record>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut dedup = Self::new();
        records.into_iter().filter(|r| dedup.admit(&r.id)).collect()
    }
}
