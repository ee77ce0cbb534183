// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Poll, profile, vote and listing lookups over an [`EventSource`].

use ballot_proto::{
    kind, recent_polls, EventId, Filter, ListingEntry, PollDefinition, Profile, ProtoError, Record,
    VoteChoice,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::collector::{collect, CollectPolicy, Collected, Termination};
use crate::resolver::resolve_latest;
use crate::session::Session;
use crate::settings::EngineSettings;
use crate::source::EventSource;
use crate::tally::{Tally, TallyAggregator};

/// Lookup failures surfaced to the view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No matching record arrived before the deadline.
    #[error("poll {0} not found")]
    NotFound(EventId),
    /// The record arrived but cannot be interpreted.
    #[error(transparent)]
    Malformed(#[from] ProtoError),
    /// The session was cancelled or superseded.
    #[error("cancelled")]
    Cancelled,
}

/// Outcome of a vote collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteResults {
    /// Option counts after latest-wins.
    pub tally: Tally,
    /// Distinct voters with a recognized choice.
    pub voters: usize,
    /// Vote records accepted in the session (deduplicated).
    pub records: Vec<Record>,
    /// Why collection stopped; partial results are still valid.
    pub termination: Termination,
}

/// Outcome of a listing collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Rows newest first.
    pub entries: Vec<ListingEntry>,
    /// Why collection stopped.
    pub termination: Termination,
}

/// The lookups a poll view needs, each one bounded collection session.
#[derive(Debug, Clone)]
pub struct PollQueries<S> {
    source: S,
    settings: EngineSettings,
}

impl<S> PollQueries<S>
where
    S: EventSource,
{
    /// Wrap a source with the given settings.
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self { source, settings }
    }

    /// Active settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    async fn run<P>(
        &self,
        filter: &Filter,
        policy: CollectPolicy,
        session: &Session,
        accept: P,
    ) -> Result<Collected, FetchError>
    where
        P: FnMut(&Record) -> bool + Send,
    {
        let out = collect(self.source.query(filter), filter, policy, session, accept).await;
        if out.termination == Termination::Cancelled {
            return Err(FetchError::Cancelled);
        }
        if let Termination::StreamError(reason) = &out.termination {
            warn!(%reason, accepted = out.records.len(), "source ended with error");
        }
        Ok(out)
    }

    /// First poll record with exactly `id`.
    #[instrument(skip(self, session), fields(generation = session.generation()))]
    pub async fn fetch_poll(
        &self,
        id: &str,
        session: &Session,
    ) -> Result<PollDefinition, FetchError> {
        let filter = Filter::new().id(id).kind(kind::POLL);
        let out = self
            .run(&filter, self.settings.poll_policy(), session, |r| r.id == id)
            .await?;
        let record = out
            .into_first()
            .ok_or_else(|| FetchError::NotFound(id.to_owned()))?;
        Ok(PollDefinition::from_record(&record)?)
    }

    /// First parsable profile of `author`; `Ok(None)` when none arrives.
    #[instrument(skip(self, session), fields(generation = session.generation()))]
    pub async fn fetch_profile(
        &self,
        author: &str,
        session: &Session,
    ) -> Result<Option<Profile>, FetchError> {
        let filter = Filter::new().author(author).kind(kind::PROFILE);
        let out = self
            .run(&filter, self.settings.profile_policy(), session, |r| {
                Profile::from_record(r).is_some()
            })
            .await?;
        Ok(out.into_first().as_ref().and_then(Profile::from_record))
    }

    /// Every vote on `poll_id`, resolved latest-wins per voter and tallied.
    #[instrument(skip(self, session), fields(generation = session.generation()))]
    pub async fn fetch_votes(
        &self,
        poll_id: &str,
        session: &Session,
    ) -> Result<VoteResults, FetchError> {
        let filter = Filter::new().kind(kind::VOTE).reference('e', poll_id);
        let mut agg = TallyAggregator::new(self.settings.tie_break);
        let out = self
            .run(&filter, self.settings.votes_policy(), session, |r| {
                agg.offer(r);
                true
            })
            .await?;
        let voters = agg.voters();
        info!(
            records = out.records.len(),
            voters,
            ignored = agg.ignored(),
            termination = ?out.termination,
            "votes collected"
        );
        Ok(VoteResults {
            tally: agg.finish(),
            voters,
            records: out.records,
            termination: out.termination,
        })
    }

    /// Latest vote by `voter` on `poll_id`, if any.
    #[instrument(skip(self, session), fields(generation = session.generation()))]
    pub async fn fetch_user_vote(
        &self,
        poll_id: &str,
        voter: &str,
        session: &Session,
    ) -> Result<Option<VoteChoice>, FetchError> {
        let filter = Filter::new()
            .author(voter)
            .kind(kind::VOTE)
            .reference('e', poll_id);
        let out = self
            .run(&filter, self.settings.user_vote_policy(), session, |_| true)
            .await?;
        Ok(resolve_latest(
            out.records.iter().filter_map(VoteChoice::from_record),
            self.settings.tie_break,
        ))
    }

    /// Recent polls, newest first, capped at the display size.
    #[instrument(skip(self, session), fields(generation = session.generation()))]
    pub async fn list_polls(&self, session: &Session) -> Result<Listing, FetchError> {
        let filter = Filter::new()
            .kind(kind::POLL)
            .limit(self.settings.listing_limit);
        let out = self
            .run(&filter, self.settings.listing_policy(), session, |_| true)
            .await?;
        if out.late > 0 {
            info!(late = out.late, "dropped polls arriving after grace period");
        }
        Ok(Listing {
            entries: recent_polls(&out.records, self.settings.listing_display),
            termination: out.termination,
        })
    }
}
