// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Latest-wins resolution of per-voter choices.

use std::cmp::Ordering;
use std::collections::HashMap;

use ballot_proto::{PubKey, VoteChoice};
use serde::{Deserialize, Serialize};

/// How two choices with the same timestamp from one voter are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep whichever arrived first. Depends on arrival order when a voter
    /// has two different choices at the same second.
    #[default]
    FirstSeen,
    /// Keep the choice whose record id sorts lowest. Independent of arrival
    /// order.
    LowestRecordId,
}

impl TieBreak {
    /// Whether `incoming` should replace `current`.
    pub fn replaces(self, current: &VoteChoice, incoming: &VoteChoice) -> bool {
        match incoming.timestamp.cmp(&current.timestamp) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self {
                Self::FirstSeen => false,
                Self::LowestRecordId => incoming.record_id < current.record_id,
            },
        }
    }
}

/// Fold one voter's choices left to right, keeping the latest.
pub fn resolve_latest<I>(choices: I, tie_break: TieBreak) -> Option<VoteChoice>
where
    I: IntoIterator<Item = VoteChoice>,
{
    choices.into_iter().fold(None, |current, incoming| match current {
        Some(c) if !tie_break.replaces(&c, &incoming) => Some(c),
        _ => Some(incoming),
    })
}

/// Incremental latest-wins map from voter to choice.
#[derive(Debug, Clone, Default)]
pub struct BallotBox {
    tie_break: TieBreak,
    ballots: HashMap<PubKey, VoteChoice>,
}

impl BallotBox {
    /// Empty box using `tie_break` for equal timestamps.
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            tie_break,
            ballots: HashMap::new(),
        }
    }

    /// Offer a choice; returns `true` if it became the voter's ballot.
    pub fn offer(&mut self, choice: VoteChoice) -> bool {
        match self.ballots.get_mut(&choice.voter) {
            Some(current) => {
                if self.tie_break.replaces(current, &choice) {
                    *current = choice;
                    true
                } else {
                    false
                }
            }
            None => {
                self.ballots.insert(choice.voter.clone(), choice);
                true
            }
        }
    }

    /// Current ballot of `voter`.
    pub fn get(&self, voter: &str) -> Option<&VoteChoice> {
        self.ballots.get(voter)
    }

    /// Number of distinct voters.
    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    /// True when no ballot has been cast.
    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    /// Resolved ballots in unspecified order.
    pub fn ballots(&self) -> impl Iterator<Item = &VoteChoice> {
        self.ballots.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(record: &str, voter: &str, option: &str, at: u64) -> VoteChoice {
        VoteChoice {
            record_id: record.into(),
            voter: voter.into(),
            option_id: option.into(),
            timestamp: at,
            poll_id: None,
        }
    }

    #[test]
    fn later_timestamp_wins() {
        let got = resolve_latest(
            vec![choice("r1", "A", "0", 100), choice("r2", "A", "1", 200)],
            TieBreak::FirstSeen,
        );
        assert_eq!(got.map(|c| c.option_id), Some("1".to_owned()));
    }

    #[test]
    fn older_arrival_after_newer_is_ignored() {
        let got = resolve_latest(
            vec![choice("r2", "A", "1", 200), choice("r1", "A", "0", 100)],
            TieBreak::FirstSeen,
        );
        assert_eq!(got.map(|c| c.option_id), Some("1".to_owned()));
    }

    #[test]
    fn first_seen_wins_exact_ties_by_default() {
        let got = resolve_latest(
            vec![choice("rb", "A", "0", 100), choice("ra", "A", "1", 100)],
            TieBreak::default(),
        );
        assert_eq!(got.map(|c| c.record_id), Some("rb".to_owned()));
    }

    #[test]
    fn lowest_record_id_breaks_ties_regardless_of_order() {
        for order in [["rb", "ra"], ["ra", "rb"]] {
            let got = resolve_latest(
                order.iter().map(|id| choice(id, "A", id, 100)),
                TieBreak::LowestRecordId,
            );
            assert_eq!(got.map(|c| c.record_id), Some("ra".to_owned()));
        }
    }

    #[test]
    fn empty_input_resolves_to_none() {
        assert!(resolve_latest(Vec::new(), TieBreak::FirstSeen).is_none());
    }

    #[test]
    fn ballot_box_keeps_one_entry_per_voter() {
        let mut b = BallotBox::new(TieBreak::FirstSeen);
        assert!(b.offer(choice("r1", "A", "0", 100)));
        assert!(b.offer(choice("r2", "B", "0", 100)));
        assert!(b.offer(choice("r3", "A", "1", 200)));
        assert!(!b.offer(choice("r4", "A", "2", 150)));
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("A").map(|c| c.option_id.as_str()), Some("1"));
    }
}
