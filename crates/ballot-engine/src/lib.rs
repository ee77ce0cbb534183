// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Collection and aggregation engine for relay-backed polls.
//!
//! Relays answer a [`Filter`](ballot_proto::Filter) with an open-ended stream
//! of records that may repeat, arrive out of order, or never finish. The
//! engine turns such streams into finite, deterministic results:
//!
//! - [`collector`] drives one bounded session under a [`CollectPolicy`]
//!   (first-match, collect-until-quiet, listing-with-grace) and resolves it
//!   exactly once.
//! - [`dedup`] drops records already seen in the session.
//! - [`resolver`] keeps each voter's latest choice.
//! - [`tally`] folds resolved choices into option counts.
//! - [`queries`] wires the above into the poll/profile/vote/listing lookups.
//! - [`submit`] signs and publishes a vote through an external [`Signer`].
//! - [`controller`] owns the current session on behalf of a [`PollView`].

pub mod collector;
pub mod controller;
pub mod dedup;
pub mod queries;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod source;
pub mod submit;
pub mod tally;

pub use collector::{collect, CollectMode, CollectPolicy, Collected, Termination};
pub use controller::{OptionRow, PollController, PollPage, PollView};
pub use dedup::Deduplicator;
pub use queries::{FetchError, Listing, PollQueries, VoteResults};
pub use resolver::{resolve_latest, BallotBox, TieBreak};
pub use session::{Session, SessionTracker};
pub use settings::{EngineSettings, SETTINGS_KEY};
pub use source::{Ack, AckStream, EventSource, PublishEvent, RecordStream, SourceEvent};
pub use submit::{publish, submit_vote, PublishFailure, Receipt, Signer, SignerError, SubmitError};
pub use tally::{tally_records, Tally, TallyAggregator};
