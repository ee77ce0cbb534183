// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Poll and vote views derived on demand from records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{kind, EventId, ProtoError, PubKey, Record, Timestamp};

/// One selectable answer of a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option identifier referenced by votes.
    pub id: String,
    /// Display text (may contain `:shortcode:` emoji references).
    pub text: String,
}

/// Poll view over a kind-1068 record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDefinition {
    /// Record id of the poll.
    pub id: EventId,
    /// Poll author.
    pub author: PubKey,
    /// Creation time of the poll record.
    pub created_at: Timestamp,
    /// Question text (record content).
    pub question: String,
    /// Options in tag order.
    pub options: Vec<PollOption>,
    /// Custom emoji: shortcode (without colons) → image URL.
    pub emoji: BTreeMap<String, String>,
}

impl PollDefinition {
    /// Derive the poll view. A poll without any parsable option is malformed.
    pub fn from_record(record: &Record) -> Result<Self, ProtoError> {
        if record.kind != kind::POLL {
            return Err(ProtoError::MalformedRecord {
                id: record.id.clone(),
                reason: "not a poll record",
            });
        }
        let options: Vec<PollOption> = record
            .tags_named("option")
            .filter_map(|t| match (t.get(1), t.get(2)) {
                (Some(id), Some(text)) => Some(PollOption {
                    id: id.clone(),
                    text: text.clone(),
                }),
                _ => None,
            })
            .collect();
        if options.is_empty() {
            return Err(ProtoError::MalformedRecord {
                id: record.id.clone(),
                reason: "poll has no options",
            });
        }
        let emoji = record
            .tags_named("emoji")
            .filter_map(|t| match (t.get(1), t.get(2)) {
                (Some(code), Some(url)) if !code.is_empty() && !url.is_empty() => {
                    Some((code.clone(), url.clone()))
                }
                _ => None,
            })
            .collect();
        Ok(Self {
            id: record.id.clone(),
            author: record.pubkey.clone(),
            created_at: record.created_at,
            question: record.content.clone(),
            options,
            emoji,
        })
    }

    /// Look up an option by id.
    pub fn option(&self, id: &str) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// A single voter's answer extracted from a kind-1018 record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteChoice {
    /// Record the choice came from.
    pub record_id: EventId,
    /// Voter public key.
    pub voter: PubKey,
    /// Chosen option id.
    pub option_id: String,
    /// Record creation time.
    pub timestamp: Timestamp,
    /// Poll referenced through the first `e` tag, if any.
    pub poll_id: Option<EventId>,
}

impl VoteChoice {
    /// Extract the choice from the first recognized option tag.
    ///
    /// Two shapes are accepted: `["poll_option", _, id]` and `["response", id]`.
    /// Records with neither yield `None`; that is not an error.
    pub fn from_record(record: &Record) -> Option<Self> {
        let option_id = record.tags.iter().find_map(|tag| {
            let value = match tag.first().map(String::as_str) {
                Some("poll_option") => tag.get(2),
                Some("response") => tag.get(1),
                _ => None,
            };
            value.filter(|v| !v.is_empty()).cloned()
        })?;
        Some(Self {
            record_id: record.id.clone(),
            voter: record.pubkey.clone(),
            option_id,
            timestamp: record.created_at,
            poll_id: record.first_tag_value("e").map(str::to_owned),
        })
    }
}
