// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event source replaying records captured from relays.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ballot_engine::{AckStream, EventSource, PublishEvent, RecordStream, SourceEvent};
use ballot_proto::{Filter, Record};
use futures_util::stream::{self, StreamExt};
use serde_json::Value;
use tracing::debug;

/// Read-only source over a capture file.
///
/// Every query answers with the matching captured records followed by
/// `Complete`, like a relay that has sent all stored events.
#[derive(Debug, Clone, Default)]
pub struct CaptureSource {
    records: Arc<Vec<Record>>,
}

impl CaptureSource {
    /// Load a capture file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open capture {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("read capture {}", path.display()))
    }

    /// Parse newline-delimited records. Each line is either a bare record
    /// object or a relay frame `["EVENT", <sub>, {record}]`; other frames
    /// (`EOSE`, `NOTICE`, ...) and blank lines are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut records = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value =
                serde_json::from_str(line).with_context(|| format!("line {}", n + 1))?;
            let Some(record) = unwrap_frame(value) else {
                debug!(line = n + 1, "skipping non-event frame");
                continue;
            };
            let record: Record =
                serde_json::from_value(record).with_context(|| format!("line {}", n + 1))?;
            records.push(record);
        }
        Ok(Self {
            records: Arc::new(records),
        })
    }

    /// Number of captured records (duplicates included).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True for an empty capture.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn unwrap_frame(value: Value) -> Option<Value> {
    match value {
        Value::Array(mut frame) => {
            if frame.first().and_then(Value::as_str) == Some("EVENT") && frame.len() >= 3 {
                Some(frame.swap_remove(2))
            } else {
                None
            }
        }
        other @ Value::Object(_) => Some(other),
        _ => None,
    }
}

impl EventSource for CaptureSource {
    fn query(&self, filter: &Filter) -> RecordStream {
        let matching: Vec<SourceEvent> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .map(SourceEvent::Record)
            .chain(std::iter::once(SourceEvent::Complete))
            .collect();
        stream::iter(matching).boxed()
    }

    fn publish(&self, _record: &Record) -> AckStream {
        stream::iter([PublishEvent::Error(
            "capture replay cannot publish".to_owned(),
        )])
        .boxed()
    }
}
