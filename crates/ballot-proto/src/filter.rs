// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Structural query filter sent to relays and re-applied locally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EventId, PubKey, Record};

/// Subscription filter.
///
/// Relays share connections across unrelated subscriptions and are free to
/// over-deliver, so every consumer re-checks incoming records with
/// [`Filter::matches`] instead of trusting the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Exact record ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<EventId>,
    /// Author public keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<PubKey>,
    /// Record kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<u16>,
    /// Tag references keyed as `#<letter>` (e.g. `#e` → referenced poll ids).
    #[serde(flatten)]
    pub tag_refs: BTreeMap<String, Vec<String>>,
    /// Advisory result-count hint; never enforced locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    /// Empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact id.
    pub fn id(mut self, id: impl Into<EventId>) -> Self {
        self.ids.push(id.into());
        self
    }

    /// Add an author.
    pub fn author(mut self, author: impl Into<PubKey>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Add a kind.
    pub fn kind(mut self, kind: u16) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Require a `letter` tag whose first value is `value` (any of, per letter).
    pub fn reference(mut self, letter: char, value: impl Into<String>) -> Self {
        self.tag_refs
            .entry(format!("#{letter}"))
            .or_default()
            .push(value.into());
        self
    }

    /// Set the advisory limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Structural match against every field except `limit`.
    pub fn matches(&self, record: &Record) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&record.id) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&record.pubkey) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&record.kind) {
            return false;
        }
        self.tag_refs.iter().all(|(key, wanted)| {
            let name = key.strip_prefix('#').unwrap_or(key);
            wanted.is_empty() || wanted.iter().any(|v| record.has_tag_value(name, v))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::kind;

    fn vote(id: &str, author: &str, poll: &str) -> Record {
        Record {
            id: id.into(),
            pubkey: author.into(),
            kind: kind::VOTE,
            created_at: 1,
            content: String::new(),
            tags: vec![vec!["e".into(), poll.into()]],
            sig: String::new(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&vote("1", "a", "p")));
    }

    #[test]
    fn kind_and_reference_must_both_hold() {
        let f = Filter::new().kind(kind::VOTE).reference('e', "p");
        assert!(f.matches(&vote("1", "a", "p")));
        assert!(!f.matches(&vote("1", "a", "other")));

        let mut poll = vote("2", "a", "p");
        poll.kind = kind::POLL;
        assert!(!f.matches(&poll));
    }

    #[test]
    fn ids_and_authors_are_any_of() {
        let f = Filter::new().id("1").id("2").author("a");
        assert!(f.matches(&vote("2", "a", "p")));
        assert!(!f.matches(&vote("3", "a", "p")));
        assert!(!f.matches(&vote("1", "b", "p")));
    }

    #[test]
    fn limit_is_advisory() {
        let f = Filter::new().limit(0);
        assert!(f.matches(&vote("1", "a", "p")));
    }

    #[test]
    fn serializes_tag_refs_with_hash_keys() {
        let f = Filter::new().kind(kind::VOTE).reference('e', "p").limit(20);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kinds": [1018], "#e": ["p"], "limit": 20})
        );
    }
}
