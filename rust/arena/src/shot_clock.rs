//! Per-model response budgets and the stuck-loop detector.

use std::collections::{BTreeMap, HashMap};

use arena_engine::game::PlayerId;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::violation::ViolationKind;

/// Consecutive identical fingerprints that forfeit the match.
pub const STUCK_LOOP_LIMIT: usize = 3;

/// Response-time budgets. Checked after the response arrives; a call in
/// flight is never cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotClockConfig {
    /// Budget for every model without an override. No budget when unset.
    pub default_ms: Option<u64>,
    /// Budgets keyed by model id.
    pub per_model: BTreeMap<String, u64>,
}

impl ShotClockConfig {
    pub fn with_default(ms: u64) -> Self {
        Self {
            default_ms: Some(ms),
            per_model: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ms == Some(0) || self.per_model.values().any(|ms| *ms == 0) {
            return Err(ConfigError::invalid("shot_clock", "budgets must be >=1 ms"));
        }
        Ok(())
    }

    pub fn budget_for(&self, model_id: &str) -> Option<u64> {
        self.per_model.get(model_id).copied().or(self.default_ms)
    }
}

/// Informational line appended to prompts when a budget applies.
pub fn shot_clock_notice(budget_ms: u64) -> String {
    format!(
        "\nShot clock: respond within {} ms. Slower responses forfeit the turn.",
        budget_ms
    )
}

type Fingerprint = (ViolationKind, String);

/// Tracks each player's run of identical violations.
///
/// A fingerprint is the violation kind plus the normalised identity of the
/// offending output. Any success clears the player's run.
#[derive(Debug, Clone)]
pub struct StuckLoopDetector {
    limit: usize,
    runs: HashMap<PlayerId, (Fingerprint, usize)>,
}

impl Default for StuckLoopDetector {
    fn default() -> Self {
        Self::new(STUCK_LOOP_LIMIT)
    }
}

impl StuckLoopDetector {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            runs: HashMap::new(),
        }
    }

    /// Record a violation; true once the same fingerprint repeats `limit`
    /// times in a row.
    pub fn observe(&mut self, player: &str, kind: ViolationKind, identity: &str) -> bool {
        let fingerprint = (kind, identity.to_string());
        let run = self
            .runs
            .entry(player.to_string())
            .or_insert_with(|| (fingerprint.clone(), 0));
        if run.0 == fingerprint {
            run.1 += 1;
        } else {
            *run = (fingerprint, 1);
        }
        run.1 >= self.limit
    }

    pub fn clear(&mut self, player: &str) {
        self.runs.remove(player);
    }

    pub fn run_length(&self, player: &str) -> usize {
        self.runs.get(player).map_or(0, |(_, n)| *n)
    }
}
