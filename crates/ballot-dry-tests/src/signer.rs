// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fake external signer.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use ballot_engine::{Signer, SignerError};
use ballot_proto::{PubKey, Record, UnsignedRecord};

use crate::records::hex_id;

/// How [`FakeSigner`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerMode {
    /// Sign everything.
    Accept,
    /// Expose the key but refuse to sign.
    Reject,
    /// No key available at all.
    Unavailable,
    /// "Sign" without producing a signature.
    Unsigned,
}

/// Signer double; ids are a blake3 hash of the draft.
#[derive(Debug)]
pub struct FakeSigner {
    pubkey: PubKey,
    mode: SignerMode,
    drafts: Mutex<Vec<UnsignedRecord>>,
}

impl FakeSigner {
    /// Signer for `pubkey` in `mode`.
    pub fn new(pubkey: impl Into<PubKey>, mode: SignerMode) -> Self {
        Self {
            pubkey: pubkey.into(),
            mode,
            drafts: Mutex::new(Vec::new()),
        }
    }

    /// Accepting signer for `pubkey`.
    pub fn accepting(pubkey: impl Into<PubKey>) -> Self {
        Self::new(pubkey, SignerMode::Accept)
    }

    /// Drafts handed to `sign`, in order.
    pub fn drafts(&self) -> Vec<UnsignedRecord> {
        self.drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn public_key(&self) -> Result<PubKey, SignerError> {
        match self.mode {
            SignerMode::Unavailable => Err(SignerError::Unavailable),
            _ => Ok(self.pubkey.clone()),
        }
    }

    async fn sign(&self, draft: UnsignedRecord) -> Result<Record, SignerError> {
        self.drafts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(draft.clone());
        let sig = match self.mode {
            SignerMode::Unavailable => return Err(SignerError::Unavailable),
            SignerMode::Reject => return Err(SignerError::Rejected("user declined".into())),
            SignerMode::Unsigned => String::new(),
            SignerMode::Accept => "fake-signature".to_owned(),
        };
        let body = serde_json::to_string(&draft)
            .map_err(|e| SignerError::Rejected(e.to_string()))?;
        Ok(Record {
            id: hex_id(&body),
            pubkey: draft.pubkey,
            kind: draft.kind,
            created_at: draft.created_at,
            content: draft.content,
            tags: draft.tags,
            sig,
        })
    }
}
