// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single status indicator with a bounded history and repeat suppression.

use std::collections::VecDeque;

/// Status severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Work in progress.
    Loading,
    /// Last operation finished.
    Success,
    /// Last operation failed.
    Error,
}

/// One status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Severity.
    pub kind: StatusKind,
    /// Human-readable message.
    pub message: String,
}

impl Status {
    /// In-progress status.
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            message: message.into(),
        }
    }

    /// Success status.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    /// Error status.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    /// True for success and error.
    pub fn is_terminal(&self) -> bool {
        self.kind != StatusKind::Loading
    }
}

/// The indicator: the current status plus the last `max` distinct updates.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    history: VecDeque<Status>,
    max: usize,
}

impl StatusBoard {
    /// Board keeping at most `max` history entries (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            history: VecDeque::new(),
            max: max.max(1),
        }
    }

    /// Post `status`. An update identical to the current one is dropped;
    /// returns whether the indicator changed.
    pub fn post(&mut self, status: Status) -> bool {
        if self.history.back() == Some(&status) {
            return false;
        }
        if self.history.len() == self.max {
            self.history.pop_front();
        }
        self.history.push_back(status);
        true
    }

    /// What the indicator shows now.
    pub fn current(&self) -> Option<&Status> {
        self.history.back()
    }

    /// Retained updates, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Status> {
        self.history.iter()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(32)
    }
}
