// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scripted [`EventSource`] for deterministic collector tests.
//!
//! Each query replays the script registered for the first kind in its filter.
//! Records are delivered unfiltered, like a shared relay connection would, so
//! consumers must apply their own filter. Timing comes from `Delay` steps on
//! the tokio clock; run tests with paused time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ballot_engine::{Ack, AckStream, EventSource, PublishEvent, RecordStream, SourceEvent};
use ballot_proto::{Filter, Record};
use futures_util::stream::{self, StreamExt};

/// One step of a query script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver a record.
    Record(Record),
    /// Wait on the tokio clock.
    Delay(Duration),
    /// Report end of stored events.
    Complete,
    /// Report a terminal error.
    Error(String),
    /// Never yield again.
    Hang,
}

impl Step {
    /// `Delay` in milliseconds.
    pub fn delay_ms(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }
}

/// One step of the publish acknowledgement script.
#[derive(Debug, Clone)]
pub enum AckStep {
    /// `endpoint` stored the record.
    Accept(String),
    /// `endpoint` refused it with `message`.
    Reject(String, String),
    /// Wait on the tokio clock.
    Delay(Duration),
    /// No further acknowledgements.
    Complete,
    /// Terminal transport error.
    Error(String),
    /// Never yield again.
    Hang,
}

/// Scripted source; clones share scripts and logs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<Inner>>,
    open: Arc<AtomicUsize>,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: HashMap<u16, Vec<Step>>,
    acks: Vec<AckStep>,
    queries: Vec<Filter>,
    published: Vec<Record>,
}

impl ScriptedSource {
    /// Source whose every query completes immediately and whose publishes
    /// complete without acknowledgement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `steps` for queries on `kind`.
    pub fn on_kind(self, kind: u16, steps: Vec<Step>) -> Self {
        self.lock().scripts.insert(kind, steps);
        self
    }

    /// Deliver `records` then complete for queries on `kind`.
    pub fn with_records(self, kind: u16, records: impl IntoIterator<Item = Record>) -> Self {
        let mut steps: Vec<Step> = records.into_iter().map(Step::Record).collect();
        steps.push(Step::Complete);
        self.on_kind(kind, steps)
    }

    /// Replay `steps` for every publish.
    pub fn on_publish(self, steps: Vec<AckStep>) -> Self {
        self.lock().acks = steps;
        self
    }

    /// Filters queried so far, in order.
    pub fn queries(&self) -> Vec<Filter> {
        self.lock().queries.clone()
    }

    /// Records handed to `publish`, in order.
    pub fn published(&self) -> Vec<Record> {
        self.lock().published.clone()
    }

    /// Streams handed out and not yet dropped or exhausted.
    pub fn open_subscriptions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(&self) -> OpenGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        OpenGuard(Arc::clone(&self.open))
    }
}

/// Decrements the open-subscription count when its stream is released.
#[derive(Debug)]
struct OpenGuard(Arc<AtomicUsize>);

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EventSource for ScriptedSource {
    fn query(&self, filter: &Filter) -> RecordStream {
        let steps = {
            let mut inner = self.lock();
            inner.queries.push(filter.clone());
            filter
                .kinds
                .first()
                .and_then(|k| inner.scripts.get(k).cloned())
                .unwrap_or_else(|| vec![Step::Complete])
        };
        let guard = self.guard();
        stream::unfold(
            (steps.into_iter(), guard),
            |(mut steps, guard)| async move {
                loop {
                    let event = match steps.next()? {
                        Step::Record(r) => SourceEvent::Record(r),
                        Step::Complete => SourceEvent::Complete,
                        Step::Error(e) => SourceEvent::Error(e),
                        Step::Delay(d) => {
                            tokio::time::sleep(d).await;
                            continue;
                        }
                        Step::Hang => std::future::pending().await,
                    };
                    return Some((event, (steps, guard)));
                }
            },
        )
        .boxed()
    }

    fn publish(&self, record: &Record) -> AckStream {
        let steps = {
            let mut inner = self.lock();
            inner.published.push(record.clone());
            inner.acks.clone()
        };
        stream::unfold(steps.into_iter(), |mut steps| async move {
            loop {
                let event = match steps.next()? {
                    AckStep::Accept(endpoint) => PublishEvent::Ack(Ack {
                        endpoint,
                        accepted: true,
                        message: None,
                    }),
                    AckStep::Reject(endpoint, message) => PublishEvent::Ack(Ack {
                        endpoint,
                        accepted: false,
                        message: Some(message),
                    }),
                    AckStep::Complete => PublishEvent::Complete,
                    AckStep::Error(e) => PublishEvent::Error(e),
                    AckStep::Delay(d) => {
                        tokio::time::sleep(d).await;
                        continue;
                    }
                    AckStep::Hang => std::future::pending().await,
                };
                return Some((event, steps));
            }
        })
        .boxed()
    }
}
