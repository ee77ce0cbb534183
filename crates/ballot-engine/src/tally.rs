// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Option histograms.
//!
//! [`TallyAggregator`] is fed vote records as they arrive and applies
//! latest-wins per voter incrementally, so the final [`Tally`] depends only on
//! the set of accepted records and each voter's newest choice.

use std::collections::BTreeMap;

use ballot_proto::{Record, VoteChoice};
use serde::Serialize;

use crate::resolver::{BallotBox, TieBreak};

/// Option id → vote count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
}

impl Tally {
    /// Empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote per item, with no per-voter resolution.
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tally = Self::new();
        for option in options {
            tally.add(option);
        }
        tally
    }

    /// Add one vote for `option`.
    pub fn add(&mut self, option: impl Into<String>) {
        *self.counts.entry(option.into()).or_insert(0) += 1;
    }

    /// Votes for `option` (0 when absent).
    pub fn count(&self, option: &str) -> u64 {
        self.counts.get(option).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Share of `option` in percent, rounded half up; 0 for an empty tally.
    pub fn percentage(&self, option: &str) -> u64 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        (self.count(option) * 100 + total / 2) / total
    }

    /// True when no vote was counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts ordered by option id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Streaming per-voter aggregator.
#[derive(Debug, Clone, Default)]
pub struct TallyAggregator {
    ballots: BallotBox,
    ignored: usize,
}

impl TallyAggregator {
    /// Empty aggregator.
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            ballots: BallotBox::new(tie_break),
            ignored: 0,
        }
    }

    /// Fold one vote record in. Records without a recognized option tag are
    /// counted as ignored. Returns `true` if the voter's ballot changed.
    pub fn offer(&mut self, record: &Record) -> bool {
        match VoteChoice::from_record(record) {
            Some(choice) => self.ballots.offer(choice),
            None => {
                self.ignored += 1;
                false
            }
        }
    }

    /// Distinct voters with a ballot.
    pub fn voters(&self) -> usize {
        self.ballots.len()
    }

    /// Records that carried no recognizable choice.
    pub fn ignored(&self) -> usize {
        self.ignored
    }

    /// Current ballot of `voter`.
    pub fn ballot(&self, voter: &str) -> Option<&VoteChoice> {
        self.ballots.get(voter)
    }

    /// Histogram of the current ballots.
    pub fn tally(&self) -> Tally {
        Tally::from_options(self.ballots.ballots().map(|c| c.option_id.as_str()))
    }

    /// Consume the aggregator and fold voter → option into option → count.
    pub fn finish(self) -> Tally {
        self.tally()
    }
}

/// Tally a batch of (already deduplicated) vote records.
pub fn tally_records<'a, I>(records: I, tie_break: TieBreak) -> Tally
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut agg = TallyAggregator::new(tie_break);
    for record in records {
        agg.offer(record);
    }
    agg.finish()
}
