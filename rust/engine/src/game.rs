//! The contract every game state machine implements to plug into the match loop.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::GameError;

pub type PlayerId = String;

/// Final or current score per player, ordered by player id.
pub type Scores = BTreeMap<PlayerId, f64>;

/// Outcome of [`Game::validate_action`]. Illegal moves carry a reason that is
/// echoed back to the model in the retry prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub legal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn legal() -> Self {
        Self {
            legal: true,
            reason: None,
        }
    }

    pub fn illegal(reason: impl Into<String>) -> Self {
        Self {
            legal: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_legal(&self) -> bool {
        self.legal
    }
}

/// An observational marker for spectators. Highlights never affect play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Game-defined round the marker belongs to (the hand number in hold'em).
    pub round: u32,
    pub kind: String,
    pub description: String,
}

/// A turn-based game the match loop can referee.
///
/// The loop only ever talks to this trait. Implementations own all match
/// state; `validate_action` must be pure and is always consulted before
/// `apply_action` for model-submitted actions.
pub trait Game {
    /// Structured move decoded from model output.
    type Action: Clone + Debug + Serialize + DeserializeOwned;

    /// Name reported in the match summary.
    fn event_name(&self) -> &str;

    /// Player ids in seat order. Fixed for the match lifetime.
    fn players(&self) -> &[PlayerId];

    /// Reinitialise every mutable field from `seed`.
    fn reset(&mut self, seed: u64) -> Result<(), GameError>;

    /// The player to act, or `None` once the game is terminal.
    fn current_player(&self) -> Option<&str>;

    fn get_prompt(&self, player: &str) -> String;

    fn get_retry_prompt(&self, player: &str, reason: &str) -> String {
        format!(
            "{}\n\nYour previous response was rejected: {}\nRespond again with exactly one valid JSON action.",
            self.get_prompt(player),
            reason
        )
    }

    fn validate_action(&self, player: &str, action: &Self::Action) -> ValidationResult;

    fn apply_action(&mut self, player: &str, action: &Self::Action) -> Result<(), GameError>;

    /// Apply the deterministic, rules-legal fallback for `player` and return
    /// the action that was taken on their behalf.
    fn forfeit_turn(&mut self, player: &str) -> Result<Self::Action, GameError>;

    fn is_terminal(&self) -> bool;

    fn get_scores(&self) -> Scores;

    /// Full state including hidden information, for spectators only.
    fn get_state_snapshot(&self) -> serde_json::Value;

    /// Normalised identity of an action, ignoring free-text fields.
    fn action_identity(&self, action: &Self::Action) -> String {
        serde_json::to_string(action).unwrap_or_default()
    }

    fn highlights(&self) -> Vec<Highlight> {
        Vec::new()
    }

    /// Scores awarded when `loser` forfeits the match: the loser gets nothing
    /// and every opponent receives the sum of all current scores.
    fn forfeit_scores(&self, loser: &str) -> Scores {
        let scores = self.get_scores();
        let total: f64 = scores.values().sum();
        scores
            .keys()
            .map(|p| {
                let score = if p == loser { 0.0 } else { total };
                (p.clone(), score)
            })
            .collect()
    }
}
