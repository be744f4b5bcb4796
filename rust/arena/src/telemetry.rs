//! Turn and match records, and the sinks that receive them.
//!
//! Sinks are shared by every match in a run, so both calls must be safe to
//! make concurrently. A sink error is reported to the caller, which logs it;
//! it never changes how a match plays out.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use arena_engine::game::{Highlight, PlayerId, Scores};
use serde::{Deserialize, Serialize};

use crate::errors::TelemetryError;
use crate::referee::{FidelityReport, Ruling};
use crate::violation::ViolationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Legal,
    Forfeit,
}

/// Everything that happened on one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub player: PlayerId,
    pub model: String,
    pub prompt: String,
    pub raw_output: String,
    /// The action as decoded from the final response, even when illegal.
    pub parsed_action: Option<serde_json::Value>,
    /// The fallback applied on the player's behalf after a forfeit.
    #[serde(default)]
    pub fallback_action: Option<serde_json::Value>,
    pub parse_success: bool,
    pub validation_result: TurnOutcome,
    pub violation: Option<ViolationKind>,
    pub ruling: Option<Ruling>,
    #[serde(default)]
    pub retried: bool,
    pub state: serde_json::Value,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
    pub time_limit_ms: Option<u64>,
    pub time_exceeded: bool,
    pub cumulative_strikes: u32,
    pub strike_limit: Option<u32>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRuling {
    Completed,
    MatchForfeit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitCause {
    /// Strike limit reached.
    Referee,
    /// Same violation fingerprint three times in a row.
    StuckLoop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForfeitDetails {
    pub player: PlayerId,
    pub winner: PlayerId,
    pub cause: ForfeitCause,
    pub strikes: u32,
}

/// The single record emitted when a match ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub event: String,
    pub seed: u64,
    pub scores: Scores,
    pub fidelity: FidelityReport,
    pub player_models: BTreeMap<PlayerId, String>,
    pub highlights: Vec<Highlight>,
    pub ruling: MatchRuling,
    pub forfeit: Option<ForfeitDetails>,
    pub turns: u32,
    #[serde(default)]
    pub extras: BTreeMap<String, serde_json::Value>,
    pub finished_at: String,
}

impl MatchSummary {
    /// Players holding the top score, or the non-forfeiting player.
    pub fn winners(&self) -> Vec<PlayerId> {
        if let Some(f) = &self.forfeit {
            return vec![f.winner.clone()];
        }
        let best = self
            .scores
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        self.scores
            .iter()
            .filter(|(_, s)| **s == best)
            .map(|(p, _)| p.clone())
            .collect()
    }
}

/// One line of a telemetry JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Turn {
        match_id: String,
        record: TurnRecord,
    },
    Match {
        match_id: String,
        summary: MatchSummary,
    },
}

pub trait TelemetrySink: Send + Sync {
    fn log_turn(&self, match_id: &str, record: &TurnRecord) -> Result<(), TelemetryError>;

    fn finalize_match(&self, match_id: &str, summary: &MatchSummary) -> Result<(), TelemetryError>;
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn append(&self, event: &TelemetryEvent, flush: bool) -> Result<(), TelemetryError> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock().map_err(|_| TelemetryError::Poisoned)?;
        writeln!(writer, "{}", line)?;
        if flush {
            writer.flush()?;
        }
        Ok(())
    }
}

impl TelemetrySink for JsonlSink {
    fn log_turn(&self, match_id: &str, record: &TurnRecord) -> Result<(), TelemetryError> {
        self.append(
            &TelemetryEvent::Turn {
                match_id: match_id.to_string(),
                record: record.clone(),
            },
            false,
        )
    }

    fn finalize_match(&self, match_id: &str, summary: &MatchSummary) -> Result<(), TelemetryError> {
        self.append(
            &TelemetryEvent::Match {
                match_id: match_id.to_string(),
                summary: summary.clone(),
            },
            true,
        )
    }
}

/// Keeps every event in memory. Used by tests and by callers that only need
/// the summaries.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn turns(&self, match_id: &str) -> Vec<TurnRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TelemetryEvent::Turn { match_id: id, record } if id == match_id => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<(String, MatchSummary)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TelemetryEvent::Match { match_id, summary } => Some((match_id, summary)),
                _ => None,
            })
            .collect()
    }
}

impl TelemetrySink for MemorySink {
    fn log_turn(&self, match_id: &str, record: &TurnRecord) -> Result<(), TelemetryError> {
        self.events
            .lock()
            .map_err(|_| TelemetryError::Poisoned)?
            .push(TelemetryEvent::Turn {
                match_id: match_id.to_string(),
                record: record.clone(),
            });
        Ok(())
    }

    fn finalize_match(&self, match_id: &str, summary: &MatchSummary) -> Result<(), TelemetryError> {
        self.events
            .lock()
            .map_err(|_| TelemetryError::Poisoned)?
            .push(TelemetryEvent::Match {
                match_id: match_id.to_string(),
                summary: summary.clone(),
            });
        Ok(())
    }
}

/// Read every event from a telemetry JSONL file. Blank lines are skipped;
/// the first undecodable line is an error naming its line number.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<TelemetryEvent>, TelemetryError> {
    let content = std::fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| {
            TelemetryError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("line {}: {}", i + 1, e),
            ))
        })?;
        events.push(event);
    }
    Ok(events)
}
