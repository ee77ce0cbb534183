// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ballot CLI
//!
//! Lists, shows and tallies polls from a capture of relay output. The capture
//! is replayed as an event source that completes at end of file, so every
//! command runs the same bounded collection sessions a live view would.
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod replay;
mod view;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use ballot_app_core::config::ConfigService;
use ballot_app_core::status::StatusKind;
use ballot_config_fs::FsConfigStore;
use ballot_engine::{
    EngineSettings, PollController, PollQueries, Session, Signer, SignerError, TieBreak,
    SETTINGS_KEY,
};
use ballot_proto::{parse_event_id, PubKey, Record, UnsignedRecord};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::replay::CaptureSource;
use crate::view::TerminalView;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect relay-backed polls from captured relay output")]
struct Args {
    /// Newline-delimited records or `["EVENT", sub, {...}]` frames
    #[arg(long, value_name = "FILE")]
    capture: PathBuf,
    /// Skip loading and persisting engine settings
    #[arg(long)]
    no_config: bool,
    /// Read and write settings in this directory instead of the platform one
    #[arg(long, value_name = "DIR", conflicts_with = "no_config")]
    config_dir: Option<PathBuf>,
    /// View as this public key (enables the own-vote lookup)
    #[arg(long = "as", value_name = "PUBKEY")]
    viewer: Option<PubKey>,
    /// Override the equal-timestamp rule
    #[arg(long, value_enum)]
    tie_break: Option<TieBreakArg>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recent polls, newest first
    List,
    /// One poll
    Show {
        /// 64-hex event id
        id: String,
        /// Collect and show vote counts
        #[arg(long)]
        results: bool,
    },
    /// Vote counts as JSON
    Tally {
        /// 64-hex event id
        id: String,
    },
    /// Latest vote of one voter
    MyVote {
        /// 64-hex event id
        id: String,
        /// Voter public key
        #[arg(long)]
        voter: PubKey,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TieBreakArg {
    FirstSeen,
    LowestRecordId,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::FirstSeen => Self::FirstSeen,
            TieBreakArg::LowestRecordId => Self::LowestRecordId,
        }
    }
}

/// Exposes a public key but cannot sign; enough for the own-vote lookup.
struct WatchOnlySigner(PubKey);

#[async_trait]
impl Signer for WatchOnlySigner {
    async fn public_key(&self) -> Result<PubKey, SignerError> {
        Ok(self.0.clone())
    }

    async fn sign(&self, _draft: UnsignedRecord) -> Result<Record, SignerError> {
        Err(SignerError::Unavailable)
    }
}

fn load_settings(args: &Args) -> EngineSettings {
    if args.no_config {
        return EngineSettings::default();
    }
    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::new(),
    };
    let loaded: Result<EngineSettings, _> =
        store.and_then(|s| ConfigService::new(s).load_or_init(SETTINGS_KEY));
    match loaded {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "using default settings");
            EngineSettings::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut settings = load_settings(&args);
    if let Some(rule) = args.tie_break {
        settings.tie_break = rule.into();
    }
    if args.viewer.is_some() {
        settings.check_user_vote = true;
    }

    let source = CaptureSource::open(&args.capture)?;
    info!(
        records = source.len(),
        relays = ?settings.relays,
        "capture loaded; configured relays are not contacted during replay"
    );

    match args.cmd {
        Command::List => {
            let ctl = PollController::new(source, settings, TerminalView::new());
            ctl.open(None).await;
            finish(ctl.view())
        }
        Command::Show { id, results } => {
            let mut ctl = PollController::new(source, settings, TerminalView::new());
            if let Some(viewer) = args.viewer {
                ctl = ctl.with_signer(Arc::new(WatchOnlySigner(viewer)));
            }
            if results {
                let id = parse_event_id(&id)?;
                ctl.open_poll(&id, true).await;
            } else {
                ctl.open(Some(&id)).await;
            }
            finish(ctl.view())
        }
        Command::Tally { id } => {
            let id = parse_event_id(&id)?;
            let queries = PollQueries::new(source, settings);
            let session = Session::detached();
            let poll = queries
                .fetch_poll(&id, &session)
                .await
                .with_context(|| format!("tally {id}"))?;
            let results = queries.fetch_votes(&poll.id, &session).await?;
            let out = serde_json::json!({
                "poll": poll.id,
                "question": poll.question,
                "voters": results.voters,
                "tally": results.tally,
                "partial": results.termination.is_partial(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Command::MyVote { id, voter } => {
            let id = parse_event_id(&id)?;
            let queries = PollQueries::new(source, settings);
            match queries
                .fetch_user_vote(&id, &voter, &Session::detached())
                .await?
            {
                Some(choice) => println!("{}", choice.option_id),
                None => println!("no vote"),
            }
            Ok(())
        }
    }
}

fn finish(view: &TerminalView) -> Result<()> {
    match view.last_status() {
        Some(status) if status.kind == StatusKind::Error => bail!(status.message),
        _ => Ok(()),
    }
}
