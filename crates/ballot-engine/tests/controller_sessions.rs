// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Navigation, supersession and status reporting through the controller.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use ballot_app_core::status::StatusKind;
use ballot_dry_tests::{FakeSigner, RecordBuilder, RecordingView, ScriptedSource, Step};
use ballot_engine::{EngineSettings, PollController};
use ballot_proto::{kind, Record};

fn cheese() -> Record {
    RecordBuilder::poll("Cheese?")
        .author("alice_pubkey_hex")
        .option("0", "Yes")
        .option("1", "No")
        .build()
}

fn controller(
    source: &ScriptedSource,
    settings: EngineSettings,
) -> (PollController<ScriptedSource, RecordingView>, RecordingView) {
    let view = RecordingView::new();
    (
        PollController::new(source.clone(), settings, view.clone()),
        view,
    )
}

#[tokio::test(start_paused = true)]
async fn superseded_listing_is_never_rendered() {
    let poll = cheese();
    let source = ScriptedSource::new().on_kind(
        kind::POLL,
        vec![Step::delay_ms(500), Step::Record(poll.clone()), Step::Hang],
    );
    let (ctl, view) = controller(&source, EngineSettings::default());

    tokio::join!(ctl.open_listing(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        ctl.open_poll(&poll.id, false).await;
    });

    assert!(view.listings().is_empty());
    assert_eq!(view.pages().len(), 1);
    let kinds: Vec<StatusKind> = view.statuses().iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![StatusKind::Loading, StatusKind::Loading, StatusKind::Success]
    );
    assert_eq!(source.open_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn poll_page_shows_latest_wins_results() {
    let poll = cheese();
    let b_vote = RecordBuilder::vote(&poll.id).author("B").at(100).response("1").build();
    let source = ScriptedSource::new()
        .with_records(kind::POLL, [poll.clone()])
        .with_records(
            kind::PROFILE,
            [RecordBuilder::profile(r#"{"name":"alice"}"#)
                .author("alice_pubkey_hex")
                .build()],
        )
        .with_records(
            kind::VOTE,
            [
                RecordBuilder::vote(&poll.id).author("A").at(100).poll_option("0").build(),
                b_vote.clone(),
                RecordBuilder::vote(&poll.id).author("A").at(200).poll_option("1").build(),
                b_vote,
            ],
        );
    let (ctl, view) = controller(&source, EngineSettings::default());

    ctl.open_poll(&poll.id, true).await;

    let pages = view.pages();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.author_label, "alice");
    let rows = page.rows();
    assert_eq!(rows[0].votes, Some(0));
    assert_eq!(rows[1].votes, Some(2));
    assert_eq!(rows[1].percentage, Some(100));
    assert!(rows.iter().all(|r| !r.mine));

    let last = view.last_status().unwrap();
    assert_eq!(last.kind, StatusKind::Success);
    assert_eq!(last.message, "2 votes from 2 voters");
    assert_eq!(view.terminal_statuses(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_author_profile_falls_back_to_abbreviated_key() {
    let poll = cheese();
    let source = ScriptedSource::new().with_records(kind::POLL, [poll.clone()]);
    let (ctl, view) = controller(&source, EngineSettings::default());

    ctl.open(Some(&poll.id)).await;

    let page = view.pages().pop().unwrap();
    assert_eq!(page.author_label, "alice_pu...");
    assert!(page.results.is_none());
    assert!(page.rows().iter().all(|r| r.votes.is_none()));
}

#[tokio::test(start_paused = true)]
async fn invalid_identifier_reports_error_without_querying() {
    let source = ScriptedSource::new();
    let (ctl, view) = controller(&source, EngineSettings::default());

    ctl.open(Some("not-an-event-id")).await;

    let status = view.last_status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.message.contains("invalid identifier"));
    assert!(source.queries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_listing_reports_no_polls() {
    let source = ScriptedSource::new();
    let (ctl, view) = controller(&source, EngineSettings::default());

    ctl.open(None).await;

    assert!(view.listings().is_empty());
    let status = view.last_status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, "No poll events found");
}

#[tokio::test(start_paused = true)]
async fn listing_renders_recent_polls() {
    let source = ScriptedSource::new().with_records(
        kind::POLL,
        [
            RecordBuilder::poll("older").at(10).build(),
            RecordBuilder::poll("newer").at(20).build(),
        ],
    );
    let (ctl, view) = controller(&source, EngineSettings::default());

    ctl.open(Some("   ")).await;

    let listing = view.listings().pop().unwrap();
    let titles: Vec<&str> = listing.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);
    assert_eq!(view.last_status().unwrap().message, "2 polls");
}

#[tokio::test(start_paused = true)]
async fn unknown_poll_ends_in_not_found_after_deadline() {
    let source = ScriptedSource::new().on_kind(kind::POLL, vec![Step::Hang]);
    let (ctl, view) = controller(&source, EngineSettings::default());
    let id = ballot_dry_tests::hex_id("missing");

    let started = tokio::time::Instant::now();
    ctl.open(Some(&id)).await;

    assert!(started.elapsed() >= Duration::from_secs(10));
    let status = view.last_status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.message.contains("not found"));
    assert_eq!(view.terminal_statuses(), 1);
}

#[tokio::test(start_paused = true)]
async fn own_vote_forces_results_and_marks_choice() {
    let poll = cheese();
    let source = ScriptedSource::new()
        .with_records(kind::POLL, [poll.clone()])
        .with_records(
            kind::VOTE,
            [
                RecordBuilder::vote(&poll.id).author("me").at(50).poll_option("0").build(),
                RecordBuilder::vote(&poll.id).author("me").at(60).poll_option("1").build(),
                RecordBuilder::vote(&poll.id).author("B").at(70).poll_option("0").build(),
            ],
        );
    let settings = EngineSettings {
        check_user_vote: true,
        ..EngineSettings::default()
    };
    let view = RecordingView::new();
    let ctl = PollController::new(source.clone(), settings, view.clone())
        .with_signer(Arc::new(FakeSigner::accepting("me")));

    ctl.open_poll(&poll.id, false).await;

    let page = view.pages().pop().unwrap();
    assert!(page.results.is_some());
    let rows = page.rows();
    assert!(!rows[0].mine);
    assert!(rows[1].mine);
    assert_eq!(rows[0].votes, Some(1));
    assert_eq!(rows[1].votes, Some(1));
}

#[tokio::test(start_paused = true)]
async fn vote_check_is_skipped_without_toggle() {
    let poll = cheese();
    let source = ScriptedSource::new().with_records(kind::POLL, [poll.clone()]);
    let view = RecordingView::new();
    let ctl = PollController::new(source.clone(), EngineSettings::default(), view.clone())
        .with_signer(Arc::new(FakeSigner::accepting("me")));

    ctl.open_poll(&poll.id, false).await;

    assert!(source.queries().iter().all(|f| !f.kinds.contains(&kind::VOTE)));
    assert!(view.pages()[0].my_vote.is_none());
}

#[tokio::test(start_paused = true)]
async fn viewer_account_label_comes_from_their_profile() {
    let poll = cheese();
    let source = ScriptedSource::new()
        .with_records(kind::POLL, [poll.clone()])
        .with_records(
            kind::PROFILE,
            [
                RecordBuilder::profile(r#"{"name":"alice"}"#)
                    .author("alice_pubkey_hex")
                    .build(),
                RecordBuilder::profile(r#"{"display_name":"Me Myself"}"#)
                    .author("me")
                    .build(),
            ],
        );
    let view = RecordingView::new();
    let ctl = PollController::new(source.clone(), EngineSettings::default(), view.clone())
        .with_signer(Arc::new(FakeSigner::accepting("me")));

    ctl.open_poll(&poll.id, false).await;

    let page = view.pages().pop().unwrap();
    assert_eq!(page.author_label, "alice");
    assert_eq!(page.viewer_label.as_deref(), Some("Me Myself"));
    let profile_lookups: Vec<_> = source
        .queries()
        .into_iter()
        .filter(|f| f.kinds.contains(&kind::PROFILE))
        .flat_map(|f| f.authors)
        .collect();
    assert_eq!(profile_lookups, vec!["alice_pubkey_hex", "me"]);
}

#[tokio::test(start_paused = true)]
async fn viewer_without_profile_gets_abbreviated_key() {
    let poll = cheese();
    let source = ScriptedSource::new().with_records(kind::POLL, [poll.clone()]);
    let view = RecordingView::new();
    let ctl = PollController::new(source, EngineSettings::default(), view.clone())
        .with_signer(Arc::new(FakeSigner::accepting("viewer_pubkey_hex")));

    ctl.open_poll(&poll.id, false).await;

    let page = view.pages().pop().unwrap();
    assert_eq!(page.viewer_label.as_deref(), Some("viewer_p..."));
}

#[tokio::test(start_paused = true)]
async fn no_signer_means_no_viewer_label() {
    let poll = cheese();
    let source = ScriptedSource::new().with_records(kind::POLL, [poll.clone()]);
    let view = RecordingView::new();
    let ctl = PollController::new(source, EngineSettings::default(), view.clone());

    ctl.open_poll(&poll.id, false).await;

    assert!(view.pages()[0].viewer_label.is_none());
}
