// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use serde::{Deserialize, Serialize};

use crate::{kind, Record};

/// Author metadata carried as JSON in a kind-0 record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Short handle.
    #[serde(default)]
    pub name: Option<String>,
    /// Longer display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

impl Profile {
    /// Parse profile content. Non-profile kinds and invalid JSON yield `None`.
    pub fn from_record(record: &Record) -> Option<Self> {
        if record.kind != kind::PROFILE {
            return None;
        }
        serde_json::from_str(&record.content).ok()
    }

    /// Label for `pubkey`: `name`, then `display_name`, then an abbreviated key.
    pub fn label(profile: Option<&Self>, pubkey: &str) -> String {
        profile
            .and_then(|p| {
                p.name
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .or_else(|| p.display_name.as_deref().filter(|s| !s.is_empty()))
            })
            .map_or_else(|| abbreviate(pubkey), str::to_owned)
    }
}

fn abbreviate(pubkey: &str) -> String {
    let head: String = pubkey.chars().take(8).collect();
    format!("{head}...")
}
