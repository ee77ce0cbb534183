// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded collection over an open-ended record stream.
//!
//! One call to [`collect`] is one collection session: its own deduplication
//! set, deadline and single outcome. Competing terminal conditions (match,
//! completion, stream error, inactivity, deadline, cancellation) race inside a
//! single `select!` loop, so whichever fires first decides the
//! [`Termination`] and the others never run. Transport failures end the
//! session with whatever was accepted so far; they are never returned as
//! errors.

use std::time::Duration;

use ballot_proto::{Filter, Record};
use futures_util::StreamExt;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::dedup::Deduplicator;
use crate::session::Session;
use crate::source::{RecordStream, SourceEvent};

/// Whether a session stops at the first accepted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Stop on the first accepted record.
    FirstMatch,
    /// Accumulate until the stream ends or a timer fires.
    All,
}

/// Completion policy for one collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectPolicy {
    /// Stop condition.
    pub mode: CollectMode,
    /// Hard ceiling measured from session start.
    pub deadline: Duration,
    /// End the session when no record arrives for this long.
    pub idle: Option<Duration>,
    /// After this much elapsed time new records are dropped, but the session
    /// keeps running until completion or the deadline.
    pub grace: Option<Duration>,
}

impl CollectPolicy {
    /// Return on the first accepted record, or empty-handed at `deadline`.
    pub fn first_match(deadline: Duration) -> Self {
        Self {
            mode: CollectMode::FirstMatch,
            deadline,
            idle: None,
            grace: None,
        }
    }

    /// Accumulate until complete/error or `deadline`.
    pub fn until_quiet(deadline: Duration) -> Self {
        Self {
            mode: CollectMode::All,
            deadline,
            idle: None,
            grace: None,
        }
    }

    /// Accumulate, ignoring arrivals after `grace`, until complete/error or
    /// `deadline`.
    pub fn listing(grace: Duration, deadline: Duration) -> Self {
        Self {
            mode: CollectMode::All,
            deadline,
            idle: None,
            grace: Some(grace.min(deadline)),
        }
    }

    /// Also end the session after `idle` without any record.
    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = Some(idle);
        self
    }
}

/// Why a collection session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// First-match policy found its record.
    Matched,
    /// The source reported (or implied) completion.
    Completed,
    /// The source reported a terminal error.
    StreamError(String),
    /// No record arrived within the inactivity window.
    Idle,
    /// The hard deadline elapsed.
    Deadline,
    /// The session was cancelled or superseded.
    Cancelled,
}

impl Termination {
    /// True when the stream did not finish on its own terms; the accepted
    /// records are still a valid (partial) result.
    pub fn is_partial(&self) -> bool {
        !matches!(self, Self::Matched | Self::Completed)
    }
}

/// Outcome of one collection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Accepted records in arrival order, each id at most once.
    pub records: Vec<Record>,
    /// Terminal condition that won.
    pub termination: Termination,
    /// Records dropped because their id was already seen.
    pub duplicates: usize,
    /// Records dropped by the filter or the caller's predicate.
    pub rejected: usize,
    /// Records dropped because they arrived after the grace cutoff.
    pub late: usize,
    /// Session duration.
    pub elapsed: Duration,
}

impl Collected {
    /// First accepted record, if any.
    pub fn into_first(self) -> Option<Record> {
        self.records.into_iter().next()
    }
}

/// Run one collection session over `stream`.
///
/// Each record is deduplicated by id, then re-checked against `filter` (the
/// transport is shared and may deliver records for other subscriptions), then
/// dropped if past the grace cutoff, and finally offered to `accept`. Records
/// for which `accept` returns `true` are kept. The stream is dropped (and so
/// unsubscribed) before this returns.
pub async fn collect<P>(
    mut stream: RecordStream,
    filter: &Filter,
    policy: CollectPolicy,
    session: &Session,
    mut accept: P,
) -> Collected
where
    P: FnMut(&Record) -> bool + Send,
{
    let started = Instant::now();
    let grace_end = policy.grace.map(|g| started + g);
    let deadline = time::sleep_until(started + policy.deadline);
    tokio::pin!(deadline);
    let idle = time::sleep_until(started + policy.idle.unwrap_or(policy.deadline));
    tokio::pin!(idle);

    let mut dedup = Deduplicator::new();
    let mut records = Vec::new();
    let (mut duplicates, mut rejected, mut late) = (0usize, 0usize, 0usize);

    let termination = loop {
        tokio::select! {
            biased;
            () = session.cancelled() => break Termination::Cancelled,
            () = &mut deadline => break Termination::Deadline,
            () = &mut idle, if policy.idle.is_some() => break Termination::Idle,
            next = stream.next() => match next {
                None | Some(SourceEvent::Complete) => break Termination::Completed,
                Some(SourceEvent::Error(reason)) => break Termination::StreamError(reason),
                Some(SourceEvent::Record(record)) => {
                    if !dedup.admit(&record.id) {
                        duplicates += 1;
                        continue;
                    }
                    if !filter.matches(&record) {
                        rejected += 1;
                        continue;
                    }
                    // Only fresh, on-filter records count as activity.
                    if let Some(window) = policy.idle {
                        idle.as_mut().reset(Instant::now() + window);
                    }
                    if grace_end.is_some_and(|end| Instant::now() > end) {
                        late += 1;
                        continue;
                    }
                    if !accept(&record) {
                        rejected += 1;
                        continue;
                    }
                    records.push(record);
                    if policy.mode == CollectMode::FirstMatch {
                        break Termination::Matched;
                    }
                }
            },
        }
    };
    drop(stream);

    let elapsed = started.elapsed();
    debug!(
        ?termination,
        accepted = records.len(),
        duplicates,
        rejected,
        late,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "collection session ended"
    );
    Collected {
        records,
        termination,
        duplicates,
        rejected,
        late,
        elapsed,
    }
}
