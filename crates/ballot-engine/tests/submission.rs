// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vote signing and publish acknowledgement handling.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use ballot_app_core::status::StatusKind;
use ballot_dry_tests::{
    AckStep, FakeSigner, RecordBuilder, RecordingView, ScriptedSource, SignerMode,
};
use ballot_engine::{
    submit_vote, EngineSettings, PollController, PublishFailure, Receipt, Session, SignerError,
    SubmitError,
};
use ballot_proto::{kind, VoteChoice};

const DEADLINE: Duration = Duration::from_secs(5);

async fn submit(source: &ScriptedSource, signer: &FakeSigner) -> Result<Receipt, SubmitError> {
    submit_vote(
        source,
        signer,
        "P",
        "1",
        1_700_000_000,
        DEADLINE,
        &Session::detached(),
    )
    .await
}

#[tokio::test(start_paused = true)]
async fn first_acceptance_settles_the_publish() {
    let source = ScriptedSource::new().on_publish(vec![
        AckStep::Reject("wss://a".into(), "blocked".into()),
        AckStep::Accept("wss://b".into()),
        AckStep::Hang,
    ]);
    let signer = FakeSigner::accepting("me");

    let receipt = submit(&source, &signer).await.unwrap();

    assert_eq!(receipt.accepted_by, "wss://b");
    let choice = VoteChoice::from_record(&receipt.record).unwrap();
    assert_eq!(choice.option_id, "1");
    assert_eq!(choice.poll_id.as_deref(), Some("P"));
    assert_eq!(choice.voter, "me");
    assert_eq!(source.published().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn only_rejections_fail_with_no_acceptance() {
    let source = ScriptedSource::new().on_publish(vec![
        AckStep::Reject("wss://a".into(), "rate limited".into()),
        AckStep::Complete,
    ]);
    let err = submit(&source, &FakeSigner::accepting("me")).await.unwrap_err();
    match err {
        SubmitError::PublishFailed { reason, rejections } => {
            assert_eq!(reason, PublishFailure::NoAcceptance);
            assert_eq!(rejections.len(), 1);
            assert_eq!(rejections[0].message.as_deref(), Some("rate limited"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn silent_endpoints_time_out_at_the_deadline() {
    let source = ScriptedSource::new().on_publish(vec![AckStep::Hang]);
    let started = tokio::time::Instant::now();
    let err = submit(&source, &FakeSigner::accepting("me")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "publish failed: timed out waiting for a relay to accept"
    );
    assert!(matches!(
        err,
        SubmitError::PublishFailed { reason: PublishFailure::Timeout, .. }
    ));
    assert!(started.elapsed() >= DEADLINE);
}

#[tokio::test(start_paused = true)]
async fn late_acceptance_after_deadline_is_a_failure() {
    let source = ScriptedSource::new().on_publish(vec![
        AckStep::Delay(Duration::from_secs(6)),
        AckStep::Accept("wss://slow".into()),
    ]);
    let err = submit(&source, &FakeSigner::accepting("me")).await.unwrap_err();
    assert!(matches!(
        err,
        SubmitError::PublishFailed { reason: PublishFailure::Timeout, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn transport_error_fails_the_publish() {
    let source = ScriptedSource::new().on_publish(vec![AckStep::Error("offline".into())]);
    let err = submit(&source, &FakeSigner::accepting("me")).await.unwrap_err();
    assert_eq!(err.to_string(), "publish failed: transport error: offline");
    assert!(matches!(
        err,
        SubmitError::PublishFailed { reason: PublishFailure::StreamError(_), .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn signer_failures_never_reach_the_transport() {
    for (mode, expected) in [
        (SignerMode::Unavailable, SignerError::Unavailable),
        (SignerMode::Reject, SignerError::Rejected("user declined".into())),
    ] {
        let source = ScriptedSource::new().on_publish(vec![AckStep::Accept("wss://a".into())]);
        let err = submit(&source, &FakeSigner::new("me", mode)).await.unwrap_err();
        assert_eq!(err, SubmitError::Signer(expected));
        assert!(source.published().is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn unsigned_record_is_rejected_before_publish() {
    let source = ScriptedSource::new().on_publish(vec![AckStep::Accept("wss://a".into())]);
    let err = submit(&source, &FakeSigner::new("me", SignerMode::Unsigned))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Signer(SignerError::Rejected(_))));
    assert!(source.published().is_empty());
}

#[tokio::test(start_paused = true)]
async fn controller_reopens_poll_with_results_after_voting() {
    let poll = RecordBuilder::poll("Cheese?").option("0", "Yes").option("1", "No").build();
    let source = ScriptedSource::new()
        .with_records(kind::POLL, [poll.clone()])
        .on_publish(vec![AckStep::Accept("wss://yabu.me".into()), AckStep::Hang]);
    let view = RecordingView::new();
    let ctl = PollController::new(source.clone(), EngineSettings::default(), view.clone());
    let signer = FakeSigner::accepting("me");

    let receipt = ctl.submit_vote(&signer, &poll.id, "0").await.unwrap();

    assert_eq!(receipt.accepted_by, "wss://yabu.me");
    let statuses = view.statuses();
    assert_eq!(statuses[0].message, "Submitting vote...");
    assert_eq!(statuses[1].kind, StatusKind::Success);
    let page = view.pages().pop().unwrap();
    assert!(page.results.is_some());
    assert_eq!(signer.drafts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_vote_reports_error_status() {
    let source = ScriptedSource::new().on_publish(vec![AckStep::Complete]);
    let view = RecordingView::new();
    let ctl = PollController::new(source, EngineSettings::default(), view.clone());

    let res = ctl
        .submit_vote(&FakeSigner::accepting("me"), "P", "0")
        .await;

    assert!(res.is_err());
    assert_eq!(view.last_status().unwrap().kind, StatusKind::Error);
    assert!(view.pages().is_empty());
}
