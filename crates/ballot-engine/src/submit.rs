// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vote submission: sign through an external signer, publish, await the
//! first acceptance.

use std::time::Duration;

use async_trait::async_trait;
use ballot_proto::{PubKey, Record, Timestamp, UnsignedRecord};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::time;
use tracing::{info, instrument, warn};

use crate::session::Session;
use crate::source::{Ack, EventSource, PublishEvent};

/// Signer failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    /// No signer is installed or it refused to expose a key.
    #[error("signer unavailable")]
    Unavailable,
    /// The signer declined or produced an unusable signature.
    #[error("signer rejected the request: {0}")]
    Rejected(String),
}

/// External key holder. The engine never sees private keys.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Public key votes are published under.
    async fn public_key(&self) -> Result<PubKey, SignerError>;
    /// Assign `id` and `sig` to a draft.
    async fn sign(&self, draft: UnsignedRecord) -> Result<Record, SignerError>;
}

/// Why a publish produced no acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishFailure {
    /// Every endpoint answered (or the stream ended) without accepting.
    #[error("no relay accepted the vote")]
    NoAcceptance,
    /// The transport failed before any endpoint accepted.
    #[error("transport error: {0}")]
    StreamError(String),
    /// The deadline elapsed before any endpoint accepted.
    #[error("timed out waiting for a relay to accept")]
    Timeout,
}

/// Submission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Signing failed.
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// No endpoint accepted the record.
    #[error("publish failed: {reason}")]
    PublishFailed {
        /// Terminal condition.
        reason: PublishFailure,
        /// Explicit rejections received before it.
        rejections: Vec<Ack>,
    },
    /// The session was cancelled before an acceptance arrived.
    #[error("cancelled")]
    Cancelled,
}

/// Proof of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// The signed record as published.
    pub record: Record,
    /// Endpoint whose acceptance settled the publish.
    pub accepted_by: String,
}

/// Publish `record` and resolve on the first accepting endpoint.
///
/// There is no retry. The acknowledgement stream is dropped on return.
pub async fn publish<S>(
    source: &S,
    record: Record,
    deadline: Duration,
    session: &Session,
) -> Result<Receipt, SubmitError>
where
    S: EventSource + ?Sized,
{
    let mut acks = source.publish(&record);
    let timer = time::sleep(deadline);
    tokio::pin!(timer);
    let mut rejections = Vec::new();

    let reason = loop {
        tokio::select! {
            biased;
            () = session.cancelled() => return Err(SubmitError::Cancelled),
            () = &mut timer => break PublishFailure::Timeout,
            next = acks.next() => match next {
                Some(PublishEvent::Ack(ack)) if ack.accepted => {
                    info!(endpoint = %ack.endpoint, id = %record.id, "record accepted");
                    return Ok(Receipt { record, accepted_by: ack.endpoint });
                }
                Some(PublishEvent::Ack(ack)) => {
                    warn!(endpoint = %ack.endpoint, message = ?ack.message, "record rejected");
                    rejections.push(ack);
                }
                Some(PublishEvent::Error(e)) => break PublishFailure::StreamError(e),
                Some(PublishEvent::Complete) | None => break PublishFailure::NoAcceptance,
            },
        }
    };
    warn!(?reason, rejected = rejections.len(), id = %record.id, "publish failed");
    Err(SubmitError::PublishFailed { reason, rejections })
}

/// Sign and publish a vote for `option_id` on `poll_id`.
#[instrument(skip(source, signer, session))]
pub async fn submit_vote<S>(
    source: &S,
    signer: &dyn Signer,
    poll_id: &str,
    option_id: &str,
    now: Timestamp,
    deadline: Duration,
    session: &Session,
) -> Result<Receipt, SubmitError>
where
    S: EventSource + ?Sized,
{
    let pubkey = signer.public_key().await?;
    let draft = UnsignedRecord::vote(pubkey, poll_id, option_id, now);
    let signed = signer.sign(draft).await?;
    if signed.sig.is_empty() {
        return Err(SignerError::Rejected("signed record carries no signature".into()).into());
    }
    publish(source, signed, deadline, session).await
}
