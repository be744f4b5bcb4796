use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::hand::Category;
use crate::player::ActionKind;

/// Betting street of a hold'em hand. `Showdown` is only ever current once
/// the match is over.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    pub fn next(self) -> Street {
        match self {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River | Street::Showdown => Street::Showdown,
        }
    }

    /// Board size once this street has been dealt.
    pub fn board_len(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River | Street::Showdown => 5,
        }
    }
}

/// One betting action within a hand.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: String,
    pub street: Street,
    pub action: ActionKind,
    /// Chips moved into the pot by this action.
    pub committed: u32,
    /// True when the action was the engine's fallback for a forfeited turn.
    #[serde(default)]
    pub forfeited: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandEnding {
    Fold,
    Showdown,
}

/// A player's hand as revealed at showdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShowdownHand {
    pub player: String,
    pub hole: Vec<Card>,
    pub category: Category,
}

/// Completed hand, kept for the whole match and exposed in snapshots.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandRecord {
    pub hand_number: u32,
    pub dealer: String,
    pub small_blind: u32,
    pub big_blind: u32,
    pub board: Vec<Card>,
    pub actions: Vec<ActionRecord>,
    /// Pot size at settlement.
    pub pot: u32,
    pub ending: HandEnding,
    pub winners: Vec<String>,
    /// Chips paid to each player, in seat order.
    pub payouts: [u32; 2],
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub showdown: Vec<ShowdownHand>,
    pub all_in: bool,
}
