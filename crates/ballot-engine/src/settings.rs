// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Engine settings persisted through the config service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collector::CollectPolicy;
use crate::resolver::TieBreak;

/// Config key under which [`EngineSettings`] are stored.
pub const SETTINGS_KEY: &str = "engine";

/// Relay list, vote-check toggle, tie-break rule and per-query deadlines.
///
/// Durations are stored as milliseconds. Missing fields take their defaults,
/// so older config files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Relay endpoints for the external transport adapter. The engine itself
    /// never connects; it only sees the adapter's merged [`EventSource`].
    ///
    /// [`EventSource`]: crate::EventSource
    pub relays: Vec<String>,
    /// Look up the viewer's own vote when a signer is present.
    pub check_user_vote: bool,
    /// Equal-timestamp rule for latest-wins.
    pub tie_break: TieBreak,
    /// First-match deadline for a poll by id.
    pub poll_lookup_ms: u64,
    /// First-match deadline for an author profile.
    pub profile_lookup_ms: u64,
    /// Hard deadline for the vote collection.
    pub votes_deadline_ms: u64,
    /// Inactivity window for the vote collection (`None` disables it).
    pub votes_idle_ms: Option<u64>,
    /// Deadline for the viewer's own-vote lookup.
    pub user_vote_deadline_ms: u64,
    /// Hard deadline for the recent-poll listing.
    pub listing_deadline_ms: u64,
    /// Records arriving after this are dropped from the listing.
    pub listing_grace_ms: u64,
    /// Advisory `limit` sent with the listing query.
    pub listing_limit: usize,
    /// Rows shown in the listing.
    pub listing_display: usize,
    /// Deadline for the first publish acknowledgement.
    pub publish_deadline_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            relays: vec!["wss://yabu.me".to_owned()],
            check_user_vote: false,
            tie_break: TieBreak::FirstSeen,
            poll_lookup_ms: 10_000,
            profile_lookup_ms: 5_000,
            votes_deadline_ms: 5_000,
            votes_idle_ms: Some(5_000),
            user_vote_deadline_ms: 3_000,
            listing_deadline_ms: 10_000,
            listing_grace_ms: 6_000,
            listing_limit: 20,
            listing_display: 10,
            publish_deadline_ms: 5_000,
        }
    }
}

impl EngineSettings {
    /// Poll-by-id lookup.
    pub fn poll_policy(&self) -> CollectPolicy {
        CollectPolicy::first_match(ms(self.poll_lookup_ms))
    }

    /// Author profile lookup.
    pub fn profile_policy(&self) -> CollectPolicy {
        CollectPolicy::first_match(ms(self.profile_lookup_ms))
    }

    /// Vote collection for a poll.
    pub fn votes_policy(&self) -> CollectPolicy {
        let policy = CollectPolicy::until_quiet(ms(self.votes_deadline_ms));
        match self.votes_idle_ms {
            Some(idle) => policy.with_idle(ms(idle)),
            None => policy,
        }
    }

    /// The viewer's own votes on a poll.
    pub fn user_vote_policy(&self) -> CollectPolicy {
        CollectPolicy::until_quiet(ms(self.user_vote_deadline_ms))
    }

    /// Recent-poll listing.
    pub fn listing_policy(&self) -> CollectPolicy {
        CollectPolicy::listing(ms(self.listing_grace_ms), ms(self.listing_deadline_ms))
    }

    /// Publish acknowledgement deadline.
    pub fn publish_deadline(&self) -> Duration {
        ms(self.publish_deadline_ms)
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::collector::CollectMode;

    #[test]
    fn defaults_match_documented_timings() {
        let s = EngineSettings::default();
        assert_eq!(s.poll_policy().deadline, Duration::from_secs(10));
        assert_eq!(s.poll_policy().mode, CollectMode::FirstMatch);
        assert_eq!(s.profile_policy().deadline, Duration::from_secs(5));
        assert_eq!(s.votes_policy().idle, Some(Duration::from_secs(5)));
        assert_eq!(s.user_vote_policy().deadline, Duration::from_secs(3));
        let listing = s.listing_policy();
        assert_eq!(listing.grace, Some(Duration::from_secs(6)));
        assert_eq!(listing.deadline, Duration::from_secs(10));
        assert_eq!(s.publish_deadline(), Duration::from_secs(5));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let s: EngineSettings =
            serde_json::from_str(r#"{"check_user_vote":true,"tie_break":"lowest_record_id"}"#)
                .unwrap();
        assert!(s.check_user_vote);
        assert_eq!(s.tie_break, TieBreak::LowestRecordId);
        assert_eq!(s.listing_display, 10);
        assert_eq!(s.relays, vec!["wss://yabu.me".to_owned()]);
    }

    #[test]
    fn disabling_idle_window() {
        let s = EngineSettings {
            votes_idle_ms: None,
            ..EngineSettings::default()
        };
        assert_eq!(s.votes_policy().idle, None);
    }
}
