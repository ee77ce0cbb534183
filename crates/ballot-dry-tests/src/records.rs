// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record builders for tests.

use ballot_proto::{kind, EventId, PubKey, Record, Timestamp};

/// 64-hex id derived from `seed` (blake3).
pub fn hex_id(seed: &str) -> EventId {
    blake3::hash(seed.as_bytes()).to_hex().to_string()
}

/// Builder for poll, vote and profile [`Record`]s.
///
/// Without an explicit [`id`](Self::id) the id is a blake3 hash of the other
/// fields, so equal builders yield equal records.
///
/// # Example
///
/// ```
/// use ballot_dry_tests::RecordBuilder;
///
/// let poll = RecordBuilder::poll("Cheese?")
///     .option("0", "Yes")
///     .option("1", "No")
///     .build();
/// assert_eq!(poll.kind, 1068);
/// assert_eq!(poll.id.len(), 64);
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Empty record of `kind` by author `"author"` at t=0.
    pub fn new(kind: u16) -> Self {
        Self {
            record: Record {
                id: String::new(),
                pubkey: "author".to_owned(),
                kind,
                created_at: 0,
                content: String::new(),
                tags: Vec::new(),
                sig: "sig".to_owned(),
            },
        }
    }

    /// Poll with `question` as content.
    pub fn poll(question: &str) -> Self {
        Self::new(kind::POLL).content(question)
    }

    /// Vote referencing `poll_id`; add a choice with
    /// [`poll_option`](Self::poll_option) or [`response`](Self::response).
    pub fn vote(poll_id: &str) -> Self {
        Self::new(kind::VOTE).tag(&["e", poll_id, "", "poll"])
    }

    /// Profile with raw JSON content.
    pub fn profile(json: &str) -> Self {
        Self::new(kind::PROFILE).content(json)
    }

    /// Explicit id.
    pub fn id(mut self, id: impl Into<EventId>) -> Self {
        self.record.id = id.into();
        self
    }

    /// Author key.
    pub fn author(mut self, pubkey: impl Into<PubKey>) -> Self {
        self.record.pubkey = pubkey.into();
        self
    }

    /// Creation time.
    pub fn at(mut self, created_at: Timestamp) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Content body.
    pub fn content(mut self, content: &str) -> Self {
        self.record.content = content.to_owned();
        self
    }

    /// Append a raw tag.
    pub fn tag(mut self, tag: &[&str]) -> Self {
        self.record
            .tags
            .push(tag.iter().map(|s| (*s).to_owned()).collect());
        self
    }

    /// Append `["option", id, text]`.
    pub fn option(self, id: &str, text: &str) -> Self {
        self.tag(&["option", id, text])
    }

    /// Append `["emoji", code, url]`.
    pub fn emoji(self, code: &str, url: &str) -> Self {
        self.tag(&["emoji", code, url])
    }

    /// Append `["poll_option", "0", id]`.
    pub fn poll_option(self, id: &str) -> Self {
        self.tag(&["poll_option", "0", id])
    }

    /// Append `["response", id]`.
    pub fn response(self, id: &str) -> Self {
        self.tag(&["response", id])
    }

    /// Finish the record.
    pub fn build(mut self) -> Record {
        if self.record.id.is_empty() {
            let body = serde_json::json!([
                self.record.pubkey,
                self.record.kind,
                self.record.created_at,
                self.record.content,
                self.record.tags,
            ]);
            self.record.id = hex_id(&body.to_string());
        }
        self.record
    }
}
