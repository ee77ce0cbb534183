// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session generations and cooperative cancellation.
//!
//! A view starts a new [`Session`] whenever the logical query changes (e.g.
//! navigation to another poll). Starting one cancels the previous session and
//! bumps the generation, so late results from the superseded session can be
//! recognized and discarded instead of overwriting what the view now shows.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

/// Hands out sessions; at most one is current at a time.
#[derive(Debug, Default)]
pub struct SessionTracker {
    generation: Arc<AtomicU64>,
    active: Mutex<Option<watch::Sender<bool>>>,
}

impl SessionTracker {
    /// Tracker with no active session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the active session (if any) and start a new current one.
    pub fn begin(&self) -> Session {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            let _ = previous.send(true);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = watch::channel(false);
        *active = Some(tx);
        Session {
            generation,
            current: Arc::clone(&self.generation),
            cancel: Some(rx),
        }
    }

    /// Cancel the active session without starting another.
    pub fn cancel(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = active.take() {
            let _ = previous.send(true);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Generation of the most recent `begin`/`cancel`.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Handle passed into every engine call made on behalf of one logical query.
#[derive(Debug, Clone)]
pub struct Session {
    generation: u64,
    current: Arc<AtomicU64>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Session {
    /// A session nobody can supersede (one-shot tools, submissions).
    pub fn detached() -> Self {
        Self {
            generation: 0,
            current: Arc::new(AtomicU64::new(0)),
            cancel: None,
        }
    }

    /// Generation number of this session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once this session has been cancelled or superseded.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// True while no newer session has started and this one is not cancelled.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation && !self.is_cancelled()
    }

    /// Resolves when the session is cancelled; pending forever otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Tracker dropped without cancelling: nothing can cancel us now.
                return std::future::pending().await;
            }
        }
    }

    /// Hand `value` to `deliver` only if this session is still current.
    ///
    /// Returns whether delivery happened.
    pub fn deliver<T>(&self, value: T, deliver: impl FnOnce(T)) -> bool {
        if !self.is_current() {
            return false;
        }
        deliver(value);
        true
    }
}
