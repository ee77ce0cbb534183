// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Terminal rendering of listings, poll pages and status.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use ballot_app_core::status::{Status, StatusBoard, StatusKind};
use ballot_engine::{PollPage, PollView};
use ballot_proto::text::{segments, Segment};
use ballot_proto::{ListingEntry, Timestamp};
use comfy_table::{presets::UTF8_FULL, Table};
use time::macros::format_description;
use time::OffsetDateTime;

/// Writes pages to stdout and status lines to stderr.
#[derive(Debug, Default)]
pub struct TerminalView {
    board: Mutex<StatusBoard>,
}

impl TerminalView {
    /// Fresh view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last status shown.
    pub fn last_status(&self) -> Option<Status> {
        self.board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current()
            .cloned()
    }
}

/// Replace known `:shortcode:` references with `[shortcode]`.
fn with_emoji(text: &str, emoji: &BTreeMap<String, String>) -> String {
    segments(text, emoji)
        .into_iter()
        .map(|s| match s {
            Segment::Text(t) => t.to_owned(),
            Segment::Emoji { shortcode, .. } => format!("[{shortcode}]"),
        })
        .collect()
}

/// `created_at` as a UTC date and time; raw seconds when out of range.
pub fn format_timestamp(at: Timestamp) -> String {
    let formatted = i64::try_from(at)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .and_then(|dt| {
            dt.format(format_description!("[year]-[month]-[day] [hour]:[minute] UTC"))
                .ok()
        });
    formatted.unwrap_or_else(|| format!("@{at}"))
}

/// Poll page as table text.
pub fn render_page(page: &PollPage) -> String {
    let poll = &page.poll;
    let mut out = String::new();
    if let Some(viewer) = &page.viewer_label {
        out.push_str(&format!("current account: {viewer}\n"));
    }
    out.push_str(&format!(
        "{}\nby {} on {}\n",
        with_emoji(&poll.question, &poll.emoji),
        page.author_label,
        format_timestamp(poll.created_at)
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let with_results = page.results.is_some();
    if with_results {
        table.set_header(vec!["", "Option", "Votes", "%"]);
    } else {
        table.set_header(vec!["", "Option"]);
    }
    for row in page.rows() {
        let marker = if row.mine { "*" } else { "" }.to_owned();
        let text = with_emoji(&row.text, &poll.emoji);
        match (row.votes, row.percentage) {
            (Some(votes), Some(pct)) => {
                table.add_row(vec![marker, text, votes.to_string(), format!("{pct}%")]);
            }
            _ => {
                table.add_row(vec![marker, text]);
            }
        }
    }
    out.push_str(&table.to_string());
    if let (Some(vote), Some(viewer)) = (&page.my_vote, &page.viewer_label) {
        out.push_str(&format!("\nalready voted as {viewer} (option {})", vote.option_id));
    }
    if let Some(results) = &page.results {
        out.push_str(&format!(
            "\n{} votes from {} voters{}",
            results.tally.total(),
            results.voters,
            if results.termination.is_partial() {
                " (partial)"
            } else {
                ""
            }
        ));
    }
    out
}

/// Listing as one line per poll: `<id>  <title>  (<date>)`.
pub fn render_listing(entries: &[ListingEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}  {}  ({})", e.id, e.title, format_timestamp(e.created_at)))
        .collect::<Vec<_>>()
        .join("\n")
}

impl PollView for TerminalView {
    fn show_status(&self, status: Status) {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let tag = match status.kind {
            StatusKind::Loading => "..",
            StatusKind::Success => "ok",
            StatusKind::Error => "error",
        };
        let line = format!("[{tag}] {}", status.message);
        if board.post(status) {
            eprintln!("{line}");
        }
    }

    fn render_listing(&self, entries: &[ListingEntry]) {
        println!("{}", render_listing(entries));
    }

    fn render_poll(&self, page: &PollPage) {
        println!("{}", render_page(page));
    }
}
