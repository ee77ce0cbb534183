// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Poll view that records every call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ballot_app_core::status::{Status, StatusKind};
use ballot_engine::{PollPage, PollView};
use ballot_proto::ListingEntry;

/// One call made on the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// `show_status`.
    Status(Status),
    /// `render_listing`.
    Listing(Vec<ListingEntry>),
    /// `render_poll`.
    Poll(Box<PollPage>),
}

/// [`PollView`] double; clones share the event log.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    events: Arc<Mutex<Vec<ViewEvent>>>,
}

impl RecordingView {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far.
    pub fn events(&self) -> Vec<ViewEvent> {
        self.lock().clone()
    }

    /// Status updates so far.
    pub fn statuses(&self) -> Vec<Status> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last status, if any.
    pub fn last_status(&self) -> Option<Status> {
        self.statuses().pop()
    }

    /// Number of terminal (success/error) status updates.
    pub fn terminal_statuses(&self) -> usize {
        self.statuses()
            .iter()
            .filter(|s| s.kind != StatusKind::Loading)
            .count()
    }

    /// Listings rendered so far.
    pub fn listings(&self) -> Vec<Vec<ListingEntry>> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Listing(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    /// Poll pages rendered so far.
    pub fn pages(&self) -> Vec<PollPage> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Poll(p) => Some((**p).clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ViewEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PollView for RecordingView {
    fn show_status(&self, status: Status) {
        self.lock().push(ViewEvent::Status(status));
    }

    fn render_listing(&self, entries: &[ListingEntry]) {
        self.lock().push(ViewEvent::Listing(entries.to_vec()));
    }

    fn render_poll(&self, page: &PollPage) {
        self.lock().push(ViewEvent::Poll(Box::new(page.clone())));
    }
}
