// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for relay-backed polls.
//!
//! Relays carry signed [`Record`]s. This crate defines the record shape, the
//! structural [`Filter`] sent to relays (and re-checked locally), and the pure
//! derived views the engine folds over: [`PollDefinition`], [`VoteChoice`],
//! [`Profile`] and [`ListingEntry`]. Nothing here performs I/O or verifies
//! signatures; `sig` is carried opaquely.

mod filter;
mod id;
mod listing;
mod poll;
mod profile;
mod record;
pub mod text;

pub use filter::Filter;
pub use id::parse_event_id;
pub use listing::{recent_polls, ListingEntry, TITLE_MAX_CHARS};
pub use poll::{PollDefinition, PollOption, VoteChoice};
pub use profile::Profile;
pub use record::{Record, Tag, UnsignedRecord};

use thiserror::Error;

/// Relay-assigned record identifier (64 hex characters).
pub type EventId = String;

/// Public key identifying a record author (hex).
pub type PubKey = String;

/// Unix timestamp in seconds, as claimed by the producer.
pub type Timestamp = u64;

/// Record kinds understood by the engine.
pub mod kind {
    /// Author profile metadata (JSON content).
    pub const PROFILE: u16 = 0;
    /// A vote referencing a poll.
    pub const VOTE: u16 = 1018;
    /// A poll definition.
    pub const POLL: u16 = 1068;
}

/// Errors raised while deriving views from records or parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// The record does not carry the fields a view needs.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord {
        /// Offending record id.
        id: EventId,
        /// What was missing.
        reason: &'static str,
    },
    /// An identifier could not be decoded to a raw event id.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
