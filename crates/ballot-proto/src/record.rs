// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signed record wire shape and tag helpers.

use serde::{Deserialize, Serialize};

use crate::{kind, EventId, PubKey, Timestamp};

/// Ordered string tuple attached to a record (`["option", "0", "Yes"]`).
pub type Tag = Vec<String>;

/// A signed record as delivered by a relay.
///
/// `id` is the sole deduplication key. The engine never re-derives it from the
/// other fields and never inspects `sig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier assigned by the signer.
    pub id: EventId,
    /// Author public key.
    pub pubkey: PubKey,
    /// Semantic type discriminator (see [`crate::kind`]).
    pub kind: u16,
    /// Producer-claimed creation time (seconds).
    pub created_at: Timestamp,
    /// Free text; meaning depends on `kind`.
    #[serde(default)]
    pub content: String,
    /// Typed annotations.
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Opaque signature.
    #[serde(default)]
    pub sig: String,
}

impl Record {
    /// Iterate tags whose first element equals `name`.
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.first().map(String::as_str) == Some(name))
    }

    /// First value (element 1) of the first tag named `name`.
    pub fn first_tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .filter(|t| t.first().map(String::as_str) == Some(name))
            .find_map(|t| t.get(1))
            .map(String::as_str)
    }

    /// True when any `name` tag carries `value` in element 1.
    pub fn has_tag_value(&self, name: &str, value: &str) -> bool {
        self.tags_named(name)
            .any(|t| t.get(1).map(String::as_str) == Some(value))
    }
}

/// A record awaiting a signature from an external signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedRecord {
    /// Author public key (as reported by the signer).
    pub pubkey: PubKey,
    /// Record kind.
    pub kind: u16,
    /// Creation time (seconds).
    pub created_at: Timestamp,
    /// Content body.
    pub content: String,
    /// Tags.
    pub tags: Vec<Tag>,
}

impl UnsignedRecord {
    /// Draft a vote for `option_id` on `poll_id`.
    ///
    /// Uses the `poll_option` tag shape; the `e` tag carries the `poll` marker
    /// so relays can index the reference.
    pub fn vote(pubkey: PubKey, poll_id: &str, option_id: &str, created_at: Timestamp) -> Self {
        Self {
            pubkey,
            kind: kind::VOTE,
            created_at,
            content: String::new(),
            tags: vec![
                vec![
                    "e".to_owned(),
                    poll_id.to_owned(),
                    String::new(),
                    "poll".to_owned(),
                ],
                vec![
                    "poll_option".to_owned(),
                    "0".to_owned(),
                    option_id.to_owned(),
                ],
            ],
        }
    }
}
