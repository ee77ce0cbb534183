// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session-owning controller between the queries and a view.
//!
//! The controller holds the only mutable view state: the current session.
//! Every navigation starts a new session, which cancels the old one; results
//! are handed to the [`PollView`] only while their session is still current.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ballot_app_core::status::Status;
use ballot_proto::{parse_event_id, ListingEntry, PollDefinition, Profile, PubKey, VoteChoice};
use tracing::{debug, warn};

use crate::queries::{FetchError, PollQueries, VoteResults};
use crate::session::{Session, SessionTracker};
use crate::settings::EngineSettings;
use crate::source::EventSource;
use crate::submit::{self, Receipt, Signer, SubmitError};

/// Rendering boundary. Implementations must not block.
pub trait PollView: Send + Sync {
    /// Replace the single status indicator.
    fn show_status(&self, status: Status);
    /// Show the recent-poll listing.
    fn render_listing(&self, entries: &[ListingEntry]);
    /// Show one poll.
    fn render_poll(&self, page: &PollPage);
}

/// Everything a view needs to draw one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPage {
    /// The poll.
    pub poll: PollDefinition,
    /// Display label of the author.
    pub author_label: String,
    /// Author picture URL from the profile, if any.
    pub author_picture: Option<String>,
    /// Display label of the signed-in viewer, when a signer is installed.
    pub viewer_label: Option<String>,
    /// Vote results, when requested.
    pub results: Option<VoteResults>,
    /// The viewer's own latest vote, when looked up and found.
    pub my_vote: Option<VoteChoice>,
}

/// One option line of a poll page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    /// Option id.
    pub id: String,
    /// Option text.
    pub text: String,
    /// Vote count, when results are shown.
    pub votes: Option<u64>,
    /// Rounded share in percent, when results are shown.
    pub percentage: Option<u64>,
    /// Whether this is the viewer's current choice.
    pub mine: bool,
}

impl PollPage {
    /// Option rows in poll order.
    pub fn rows(&self) -> Vec<OptionRow> {
        self.poll
            .options
            .iter()
            .map(|o| OptionRow {
                id: o.id.clone(),
                text: o.text.clone(),
                votes: self.results.as_ref().map(|r| r.tally.count(&o.id)),
                percentage: self.results.as_ref().map(|r| r.tally.percentage(&o.id)),
                mine: self.my_vote.as_ref().is_some_and(|v| v.option_id == o.id),
            })
            .collect()
    }
}

/// Drives listing/poll navigation and vote submission for one view.
pub struct PollController<S, V> {
    queries: PollQueries<S>,
    view: V,
    sessions: SessionTracker,
    signer: Option<Arc<dyn Signer>>,
}

impl<S, V> PollController<S, V>
where
    S: EventSource,
    V: PollView,
{
    /// Controller without a signer.
    pub fn new(source: S, settings: EngineSettings, view: V) -> Self {
        Self {
            queries: PollQueries::new(source, settings),
            view,
            sessions: SessionTracker::new(),
            signer: None,
        }
    }

    /// Install the signer identifying the viewer (account label and own-vote
    /// lookup).
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Underlying queries.
    pub fn queries(&self) -> &PollQueries<S> {
        &self.queries
    }

    /// The view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Cancel whatever is loading.
    pub fn cancel(&self) {
        self.sessions.cancel();
    }

    /// Listing when `identifier` is absent or blank, otherwise that poll.
    pub async fn open(&self, identifier: Option<&str>) {
        match identifier.map(str::trim).filter(|s| !s.is_empty()) {
            None => self.open_listing().await,
            Some(raw) => match parse_event_id(raw) {
                Ok(id) => self.open_poll(&id, false).await,
                Err(e) => {
                    self.sessions.cancel();
                    self.view.show_status(Status::error(e.to_string()));
                }
            },
        }
    }

    /// Load and render the recent-poll listing.
    pub async fn open_listing(&self) {
        let session = self.sessions.begin();
        self.view.show_status(Status::loading("Loading polls..."));
        match self.queries.list_polls(&session).await {
            Ok(listing) if listing.entries.is_empty() => {
                session.deliver((), |()| {
                    self.view.show_status(Status::error("No poll events found"));
                });
            }
            Ok(listing) => {
                session.deliver(listing, |l| {
                    self.view.render_listing(&l.entries);
                    self.view
                        .show_status(Status::success(format!("{} polls", l.entries.len())));
                });
            }
            Err(e) => self.fail(&session, &e),
        }
    }

    /// Load and render one poll, with results when `show_results` is set or
    /// the viewer has already voted.
    pub async fn open_poll(&self, id: &str, show_results: bool) {
        let session = self.sessions.begin();
        self.view.show_status(Status::loading("Loading poll..."));

        let poll = match self.queries.fetch_poll(id, &session).await {
            Ok(poll) => poll,
            Err(e) => return self.fail(&session, &e),
        };

        let viewer = self.viewer_key().await;
        let my_vote = match self.own_vote(&poll.id, viewer.as_deref(), &session).await {
            Ok(v) => v,
            Err(e) => return self.fail(&session, &e),
        };
        let show_results = show_results || my_vote.is_some();

        let profile = match self.queries.fetch_profile(&poll.author, &session).await {
            Ok(p) => p,
            Err(e) => return self.fail(&session, &e),
        };

        let viewer_label = match viewer {
            Some(key) if key == poll.author => Some(Profile::label(profile.as_ref(), &key)),
            Some(key) => match self.queries.fetch_profile(&key, &session).await {
                Ok(p) => Some(Profile::label(p.as_ref(), &key)),
                Err(e) => return self.fail(&session, &e),
            },
            None => None,
        };

        let results = if show_results {
            session.deliver((), |()| {
                self.view.show_status(Status::loading("Loading results..."));
            });
            match self.queries.fetch_votes(&poll.id, &session).await {
                Ok(r) => Some(r),
                Err(e) => return self.fail(&session, &e),
            }
        } else {
            None
        };

        let summary = results.as_ref().map_or_else(
            || "Poll loaded".to_owned(),
            |r| format!("{} votes from {} voters", r.tally.total(), r.voters),
        );
        let page = PollPage {
            author_label: Profile::label(profile.as_ref(), &poll.author),
            author_picture: profile.and_then(|p| p.picture),
            viewer_label,
            poll,
            results,
            my_vote,
        };
        session.deliver(page, |page| {
            self.view.render_poll(&page);
            self.view.show_status(Status::success(summary));
        });
    }

    /// Sign and publish a vote, then reopen the poll with results unless the
    /// viewer navigated elsewhere meanwhile.
    pub async fn submit_vote(
        &self,
        signer: &dyn Signer,
        poll_id: &str,
        option_id: &str,
    ) -> Result<Receipt, SubmitError> {
        let generation = self.sessions.current_generation();
        self.view.show_status(Status::loading("Submitting vote..."));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let outcome = submit::submit_vote(
            self.queries.source(),
            signer,
            poll_id,
            option_id,
            now,
            self.queries.settings().publish_deadline(),
            &Session::detached(),
        )
        .await;
        match &outcome {
            Ok(receipt) => {
                self.view.show_status(Status::success(format!(
                    "Vote accepted by {}",
                    receipt.accepted_by
                )));
                if self.sessions.current_generation() == generation {
                    self.open_poll(poll_id, true).await;
                }
            }
            Err(e) => self.view.show_status(Status::error(e.to_string())),
        }
        outcome
    }

    async fn viewer_key(&self) -> Option<PubKey> {
        let signer = self.signer.as_ref()?;
        match signer.public_key().await {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "viewer key unavailable");
                None
            }
        }
    }

    async fn own_vote(
        &self,
        poll_id: &str,
        viewer: Option<&str>,
        session: &Session,
    ) -> Result<Option<VoteChoice>, FetchError> {
        match viewer {
            Some(voter) if self.queries.settings().check_user_vote => {
                self.queries.fetch_user_vote(poll_id, voter, session).await
            }
            _ => Ok(None),
        }
    }

    fn fail(&self, session: &Session, error: &FetchError) {
        if *error == FetchError::Cancelled {
            debug!(generation = session.generation(), "session superseded");
            return;
        }
        session.deliver(error, |e| self.view.show_status(Status::error(e.to_string())));
    }
}
