//! Statistics aggregation over a telemetry JSONL file.
//!
//! Only match summaries feed the totals; turn records are counted but not
//! otherwise inspected. Lines that do not decode are reported and counted,
//! and make the command fail once the report has been printed.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use arena_core::telemetry::{MatchRuling, MatchSummary, TelemetryEvent};
use arena_core::violation::ViolationKind;
use serde::Serialize;

use crate::error::CliError;
use crate::ui;

#[derive(Debug, Default, Serialize)]
struct PlayerStats {
    matches: u64,
    wins: u64,
    match_forfeits: u64,
    turn_forfeits: u64,
    retries: u64,
    violations: BTreeMap<ViolationKind, u64>,
}

#[derive(Debug, Default, Serialize)]
struct RunStats {
    matches: u64,
    completed: u64,
    forfeited: u64,
    draws: u64,
    turns: u64,
    turn_records: u64,
    players: BTreeMap<String, PlayerStats>,
}

impl RunStats {
    fn add(&mut self, summary: &MatchSummary) {
        self.matches += 1;
        self.turns += u64::from(summary.turns);
        match summary.ruling {
            MatchRuling::Completed => self.completed += 1,
            MatchRuling::MatchForfeit => self.forfeited += 1,
        }
        let winners = summary.winners();
        if winners.len() > 1 {
            self.draws += 1;
        }

        for player in summary.scores.keys() {
            let stats = self.players.entry(player.clone()).or_default();
            stats.matches += 1;
            if winners.len() == 1 && winners[0] == *player {
                stats.wins += 1;
            }
            if summary.forfeit.as_ref().is_some_and(|f| f.player == *player) {
                stats.match_forfeits += 1;
            }
            if let Some(fidelity) = summary.fidelity.get(player) {
                stats.turn_forfeits += u64::from(fidelity.turn_forfeits);
                stats.retries += u64::from(fidelity.retries_used);
                for (kind, n) in &fidelity.violations {
                    *stats.violations.entry(*kind).or_default() += u64::from(*n);
                }
            }
        }
    }
}

/// Aggregate a telemetry file and print the totals as pretty JSON.
///
/// # Errors
///
/// `CliError::Io` when the file cannot be read, `CliError::InvalidInput`
/// when some lines could not be decoded.
pub fn handle_stats_command(
    input: &Path,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let content = std::fs::read_to_string(input)?;
    let mut stats = RunStats::default();
    let mut corrupted = 0u64;

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TelemetryEvent>(line) {
            Ok(TelemetryEvent::Match { summary, .. }) => stats.add(&summary),
            Ok(TelemetryEvent::Turn { .. }) => stats.turn_records += 1,
            Err(e) => {
                corrupted += 1;
                ui::display_warning(err, &format!("line {} skipped: {}", i + 1, e))?;
            }
        }
    }

    let json_str = serde_json::to_string_pretty(&stats).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;

    if corrupted > 0 {
        return Err(CliError::InvalidInput(format!(
            "{} corrupted line(s) in {}",
            corrupted,
            input.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::telemetry::{ForfeitCause, ForfeitDetails};
    use arena_core::referee::Fidelity;

    fn summary(scores: [f64; 2], forfeit: Option<&str>) -> MatchSummary {
        let mut fidelity = BTreeMap::new();
        let mut a = Fidelity::default();
        a.violations.insert(ViolationKind::Timeout, 2);
        a.turn_forfeits = 2;
        fidelity.insert("a".to_string(), a);
        fidelity.insert("b".to_string(), Fidelity::default());
        MatchSummary {
            event: "holdem".into(),
            seed: 1,
            scores: [("a".to_string(), scores[0]), ("b".to_string(), scores[1])]
                .into_iter()
                .collect(),
            fidelity,
            player_models: BTreeMap::new(),
            highlights: vec![],
            ruling: if forfeit.is_some() {
                MatchRuling::MatchForfeit
            } else {
                MatchRuling::Completed
            },
            forfeit: forfeit.map(|p| ForfeitDetails {
                player: p.into(),
                winner: "b".into(),
                cause: ForfeitCause::Referee,
                strikes: 2,
            }),
            turns: 10,
            extras: BTreeMap::new(),
            finished_at: String::new(),
        }
    }

    #[test]
    fn test_stats_totals_wins_draws_and_forfeits() {
        let mut stats = RunStats::default();
        stats.add(&summary([300.0, 100.0], None));
        stats.add(&summary([200.0, 200.0], None));
        stats.add(&summary([0.0, 400.0], Some("a")));

        assert_eq!(stats.matches, 3);
        assert_eq!((stats.completed, stats.forfeited, stats.draws), (2, 1, 1));
        assert_eq!(stats.turns, 30);
        let a = &stats.players["a"];
        assert_eq!((a.wins, a.match_forfeits, a.turn_forfeits), (1, 1, 6));
        assert_eq!(a.violations[&ViolationKind::Timeout], 6);
        assert_eq!(stats.players["b"].wins, 1);
    }

    #[test]
    fn test_stats_counts_corrupted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        let event = TelemetryEvent::Match {
            match_id: "m".into(),
            summary: summary([1.0, 2.0], None),
        };
        let body = format!("{}\n{{not json\n\n", serde_json::to_string(&event).unwrap());
        std::fs::write(&path, body).unwrap();

        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = handle_stats_command(&path, &mut out, &mut err);

        assert!(matches!(result, Err(CliError::InvalidInput(_))));
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["matches"], 1);
        assert!(String::from_utf8(err).unwrap().contains("line 2 skipped"));
    }
}
