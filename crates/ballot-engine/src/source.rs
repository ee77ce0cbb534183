// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event source port.
//!
//! This is the boundary to the relay transport. Adapters merge every relay's
//! subscription into one logical stream; the engine never sees individual
//! connections. Dropping a returned stream must release the underlying
//! subscription.

use std::sync::Arc;

use ballot_proto::{Filter, Record};
use futures_util::stream::BoxStream;

/// One item of a merged query stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A candidate record. May repeat and may not match the filter.
    Record(Record),
    /// Every endpoint reported end of stored events.
    Complete,
    /// Terminal failure. Some transports use this for "no relay left
    /// answering", so it is not necessarily a real fault.
    Error(String),
}

/// Merged, unordered, duplicate-prone query stream. Ending without an explicit
/// [`SourceEvent::Complete`] is treated as completion.
pub type RecordStream = BoxStream<'static, SourceEvent>;

/// Per-endpoint publish acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    /// Endpoint that answered.
    pub endpoint: String,
    /// Whether the endpoint stored the record.
    pub accepted: bool,
    /// Optional endpoint message (rejection reason).
    pub message: Option<String>,
}

/// One item of a publish acknowledgement stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    /// An endpoint answered.
    Ack(Ack),
    /// No further acknowledgements will arrive.
    Complete,
    /// Terminal transport failure.
    Error(String),
}

/// Publish acknowledgement stream; may never terminate on its own.
pub type AckStream = BoxStream<'static, PublishEvent>;

/// Multi-endpoint publish/subscribe transport.
pub trait EventSource: Send + Sync {
    /// Open a subscription for `filter`.
    fn query(&self, filter: &Filter) -> RecordStream;
    /// Publish a signed record to every endpoint.
    fn publish(&self, record: &Record) -> AckStream;
}

impl<S> EventSource for Arc<S>
where
    S: EventSource + ?Sized,
{
    fn query(&self, filter: &Filter) -> RecordStream {
        (**self).query(filter)
    }

    fn publish(&self, record: &Record) -> AckStream {
        (**self).publish(record)
    }
}
