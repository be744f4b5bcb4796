//! Per-match escalation: turns a stream of violations into rulings.
//!
//! Two independent counters drive every ruling. The per-turn counter decides
//! whether a violation earns a retry and is cleared by [`Referee::new_turn`].
//! The per-match strike counter only ever grows and decides when repeated
//! turn forfeits become a match forfeit.

use std::collections::BTreeMap;

use arena_engine::game::PlayerId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::violation::{Violation, ViolationKind};

/// Escalation thresholds for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Violations in one turn before the turn is forfeited. Values above 1
    /// grant a single retry on the first violation of a turn.
    pub turn_forfeit_threshold: u32,
    /// Strikes before the match is forfeited; never when unset.
    pub match_forfeit_threshold: Option<u32>,
    /// Violation kinds whose turn forfeits count as strikes.
    pub strike_kinds: Vec<ViolationKind>,
}

impl Default for EscalationConfig {
    /// One retry then forfeit the turn, with no match forfeiture.
    fn default() -> Self {
        Self {
            turn_forfeit_threshold: 2,
            match_forfeit_threshold: None,
            strike_kinds: ViolationKind::ALL
                .into_iter()
                .filter(|k| *k != ViolationKind::InjectionAttempt)
                .collect(),
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_forfeit_threshold == 0 {
            return Err(ConfigError::invalid(
                "escalation.turn_forfeit_threshold",
                "must be >=1",
            ));
        }
        if self.match_forfeit_threshold == Some(0) {
            return Err(ConfigError::invalid(
                "escalation.match_forfeit_threshold",
                "must be >=1",
            ));
        }
        Ok(())
    }

    pub fn is_strike(&self, kind: ViolationKind) -> bool {
        self.strike_kinds.contains(&kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ruling {
    Retry,
    ForfeitTurn,
    ForfeitMatch,
}

/// Per-player violation summary for a whole match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fidelity {
    pub violations: BTreeMap<ViolationKind, u32>,
    pub total_severity: u32,
    pub retries_used: u32,
    pub turn_forfeits: u32,
    pub strikes: u32,
}

impl Default for Fidelity {
    fn default() -> Self {
        Self {
            violations: ViolationKind::ALL.into_iter().map(|k| (k, 0)).collect(),
            total_severity: 0,
            retries_used: 0,
            turn_forfeits: 0,
            strikes: 0,
        }
    }
}

impl Fidelity {
    pub fn total_violations(&self) -> u32 {
        self.violations.values().sum()
    }
}

pub type FidelityReport = BTreeMap<PlayerId, Fidelity>;

#[derive(Debug, Clone, Default)]
struct PlayerState {
    violations_this_turn: u32,
    fidelity: Fidelity,
}

/// Escalation state for one match. Build a fresh one per match.
///
/// ```
/// use arena_core::referee::{EscalationConfig, Referee, Ruling};
/// use arena_core::violation::ViolationKind;
///
/// let mut referee = Referee::new(&["a".to_string(), "b".to_string()], EscalationConfig::default());
/// let first = referee.record_violation("a", ViolationKind::MalformedOutput, 2, "no json");
/// let second = referee.record_violation("a", ViolationKind::MalformedOutput, 2, "still no json");
/// assert_eq!((first, second), (Ruling::Retry, Ruling::ForfeitTurn));
/// ```
#[derive(Debug, Clone)]
pub struct Referee {
    config: EscalationConfig,
    players: BTreeMap<PlayerId, PlayerState>,
    forfeited_by: Option<PlayerId>,
    last: BTreeMap<PlayerId, Violation>,
}

impl Referee {
    pub fn new(players: &[PlayerId], config: EscalationConfig) -> Self {
        Self {
            config,
            players: players
                .iter()
                .map(|p| (p.clone(), PlayerState::default()))
                .collect(),
            forfeited_by: None,
            last: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    fn state(&mut self, player: &str) -> &mut PlayerState {
        self.players.entry(player.to_string()).or_default()
    }

    fn count(&mut self, player: &str, kind: ViolationKind, severity: u32, details: &str) {
        let state = self.state(player);
        *state.fidelity.violations.entry(kind).or_insert(0) += 1;
        state.fidelity.total_severity += severity;
        self.last.insert(
            player.to_string(),
            Violation {
                kind,
                severity,
                details: details.to_string(),
            },
        );
    }

    /// Count a violation and decide between a retry and a turn forfeit.
    ///
    /// Only the first violation of a turn can earn a retry, and only when
    /// the turn threshold allows more than one violation.
    pub fn record_violation(
        &mut self,
        player: &str,
        kind: ViolationKind,
        severity: u32,
        details: &str,
    ) -> Ruling {
        self.count(player, kind, severity, details);
        let allow_retry = self.config.turn_forfeit_threshold > 1;
        let state = self.state(player);
        let first_this_turn = state.violations_this_turn == 0;
        state.violations_this_turn += 1;

        let ruling = if allow_retry && first_this_turn {
            state.fidelity.retries_used += 1;
            Ruling::Retry
        } else {
            Ruling::ForfeitTurn
        };
        debug!(player, kind = %kind, severity, details, ruling = ?ruling, "violation recorded");
        ruling
    }

    /// Count a violation without asking for a ruling and without touching
    /// the retry budget. Used for informational kinds and for violations
    /// that go straight to a turn forfeit.
    pub fn note_violation(&mut self, player: &str, kind: ViolationKind, severity: u32, details: &str) {
        self.count(player, kind, severity, details);
        debug!(player, kind = %kind, severity, details, "violation noted");
    }

    /// Record that `player` forfeited a turn because of `kind`.
    ///
    /// Returns [`Ruling::ForfeitMatch`] exactly once per match, the first
    /// time a player's strikes reach the match threshold.
    pub fn record_turn_forfeit(&mut self, player: &str, kind: ViolationKind) -> Ruling {
        let strike = self.config.is_strike(kind);
        let threshold = self.config.match_forfeit_threshold;
        let already_forfeited = self.forfeited_by.is_some();
        let state = self.state(player);
        state.fidelity.turn_forfeits += 1;
        if strike {
            state.fidelity.strikes += 1;
        }
        let strikes = state.fidelity.strikes;

        match threshold {
            Some(limit) if strike && strikes >= limit && !already_forfeited => {
                warn!(player, strikes, limit, kind = %kind, "strike limit reached, match forfeited");
                self.forfeited_by = Some(player.to_string());
                Ruling::ForfeitMatch
            }
            _ => {
                info!(player, strikes, kind = %kind, "turn forfeited");
                Ruling::ForfeitTurn
            }
        }
    }

    /// Clear every player's per-turn counter.
    pub fn new_turn(&mut self) {
        for state in self.players.values_mut() {
            state.violations_this_turn = 0;
        }
    }

    pub fn get_strikes(&self, player: &str) -> u32 {
        self.players
            .get(player)
            .map_or(0, |s| s.fidelity.strikes)
    }

    pub fn strike_limit(&self) -> Option<u32> {
        self.config.match_forfeit_threshold
    }

    /// The player whose strikes forfeited the match, if any.
    pub fn forfeited_by(&self) -> Option<&str> {
        self.forfeited_by.as_deref()
    }

    pub fn last_violation(&self, player: &str) -> Option<&Violation> {
        self.last.get(player)
    }

    /// Fidelity for every known player, zero-filled for clean players.
    pub fn fidelity_report(&self) -> FidelityReport {
        self.players
            .iter()
            .map(|(p, s)| (p.clone(), s.fidelity.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> Vec<PlayerId> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn strict(turn: u32, matches: Option<u32>) -> EscalationConfig {
        EscalationConfig {
            turn_forfeit_threshold: turn,
            match_forfeit_threshold: matches,
            ..EscalationConfig::default()
        }
    }

    #[test]
    fn threshold_one_always_forfeits_the_turn() {
        let mut r = Referee::new(&players(), strict(1, None));
        for kind in ViolationKind::ALL {
            r.new_turn();
            assert_eq!(r.record_violation("a", kind, 1, ""), Ruling::ForfeitTurn);
        }
        assert_eq!(r.fidelity_report()["a"].retries_used, 0);
    }

    #[test]
    fn retry_is_granted_once_per_turn() {
        let mut r = Referee::new(&players(), EscalationConfig::default());
        assert_eq!(r.record_violation("a", ViolationKind::IllegalMove, 2, ""), Ruling::Retry);
        assert_eq!(r.record_violation("a", ViolationKind::IllegalMove, 2, ""), Ruling::ForfeitTurn);
        // the other player's budget is untouched
        assert_eq!(r.record_violation("b", ViolationKind::IllegalMove, 2, ""), Ruling::Retry);
        r.new_turn();
        assert_eq!(r.record_violation("a", ViolationKind::IllegalMove, 2, ""), Ruling::Retry);
        let report = r.fidelity_report();
        assert_eq!(report["a"].retries_used, 2);
        assert_eq!(report["a"].violations[&ViolationKind::IllegalMove], 3);
        assert_eq!(report["a"].total_severity, 6);
    }

    #[test]
    fn strikes_escalate_to_exactly_one_match_forfeit() {
        let mut r = Referee::new(&players(), strict(1, Some(2)));
        let mut rulings = Vec::new();
        let mut last = 0;
        for _ in 0..5 {
            rulings.push(r.record_turn_forfeit("a", ViolationKind::Timeout));
            assert!(r.get_strikes("a") >= last);
            last = r.get_strikes("a");
        }
        let forfeits = rulings.iter().filter(|x| **x == Ruling::ForfeitMatch).count();
        assert_eq!(forfeits, 1);
        assert_eq!(rulings[1], Ruling::ForfeitMatch);
        assert_eq!(r.forfeited_by(), Some("a"));
        assert_eq!(r.get_strikes("a"), 5);
    }

    #[test]
    fn non_strike_kinds_never_forfeit_the_match() {
        let config = EscalationConfig {
            turn_forfeit_threshold: 1,
            match_forfeit_threshold: Some(1),
            strike_kinds: vec![ViolationKind::IllegalMove],
        };
        let mut r = Referee::new(&players(), config);
        for _ in 0..50 {
            assert_eq!(r.record_turn_forfeit("a", ViolationKind::Timeout), Ruling::ForfeitTurn);
        }
        assert_eq!(r.get_strikes("a"), 0);
        assert_eq!(r.fidelity_report()["a"].turn_forfeits, 50);
        assert_eq!(r.record_turn_forfeit("a", ViolationKind::IllegalMove), Ruling::ForfeitMatch);
    }

    #[test]
    fn default_config_never_forfeits_the_match() {
        let mut r = Referee::new(&players(), EscalationConfig::default());
        for _ in 0..100 {
            assert_eq!(r.record_turn_forfeit("b", ViolationKind::MalformedOutput), Ruling::ForfeitTurn);
        }
        assert!(r.forfeited_by().is_none());
    }

    #[test]
    fn report_is_zero_filled_for_clean_players() {
        let mut r = Referee::new(&players(), EscalationConfig::default());
        r.note_violation("a", ViolationKind::InjectionAttempt, 3, "ignore previous instructions");
        let report = r.fidelity_report();
        assert_eq!(report.len(), 2);
        assert_eq!(report["b"], Fidelity::default());
        assert_eq!(report["b"].violations.len(), ViolationKind::ALL.len());
        assert_eq!(report["a"].violations[&ViolationKind::InjectionAttempt], 1);
        assert_eq!(
            r.last_violation("a").map(|v| v.kind),
            Some(ViolationKind::InjectionAttempt)
        );
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        assert!(strict(0, None).validate().is_err());
        assert!(strict(1, Some(0)).validate().is_err());
        assert!(strict(3, Some(3)).validate().is_ok());
    }
}
