use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::errors::GameError;

/// Seat position in heads-up play. The button posts the small blind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Button,
    BigBlind,
}

/// The betting decision itself. Raise amounts are raise-to totals for the
/// current street.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    /// Calls the outstanding amount; a check when nothing is owed.
    Call,
    Raise(u32),
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Fold => write!(f, "fold"),
            ActionKind::Call => write!(f, "call"),
            ActionKind::Raise(to) => write!(f, "raise:{}", to),
        }
    }
}

/// A hold'em move as submitted by a model.
///
/// On the wire this is `{"action": "raise", "amount": 40, "reasoning": "..."}`.
/// `check` is accepted for `call` and `bet` for `raise`; action names are
/// case-insensitive.
///
/// ```
/// use arena_engine::player::{Action, ActionKind};
///
/// let a: Action = serde_json::from_str(r#"{"action": "Check", "reasoning": "free card"}"#).unwrap();
/// assert_eq!(a.kind, ActionKind::Call);
/// assert_eq!(a.reasoning.as_deref(), Some("free card"));
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAction", into = "WireAction")]
pub struct Action {
    pub kind: ActionKind,
    pub reasoning: Option<String>,
}

impl Action {
    pub fn fold() -> Self {
        ActionKind::Fold.into()
    }

    pub fn call() -> Self {
        ActionKind::Call.into()
    }

    pub fn raise_to(amount: u32) -> Self {
        ActionKind::Raise(amount).into()
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self {
            kind,
            reasoning: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireAction {
    action: String,
    #[serde(default, alias = "raise_to", skip_serializing_if = "Option::is_none")]
    amount: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
}

impl TryFrom<WireAction> for Action {
    type Error = String;

    fn try_from(wire: WireAction) -> Result<Self, Self::Error> {
        let kind = match wire.action.trim().to_ascii_lowercase().as_str() {
            "fold" => ActionKind::Fold,
            "call" | "check" => ActionKind::Call,
            "raise" | "bet" => {
                let amount = wire
                    .amount
                    .as_ref()
                    .and_then(chip_amount)
                    .ok_or_else(|| "raise requires a whole-chip \"amount\"".to_string())?;
                ActionKind::Raise(amount)
            }
            other => return Err(format!("unknown action \"{}\"", other)),
        };
        Ok(Self {
            kind,
            reasoning: wire.reasoning,
        })
    }
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        let (name, amount) = match action.kind {
            ActionKind::Fold => ("fold", None),
            ActionKind::Call => ("call", None),
            ActionKind::Raise(to) => ("raise", Some(serde_json::Value::from(to))),
        };
        Self {
            action: name.to_string(),
            amount,
            reasoning: action.reasoning,
        }
    }
}

/// Accept `40`, `40.0` and `"40"`; reject fractions and negatives.
fn chip_amount(v: &serde_json::Value) -> Option<u32> {
    match v {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return u32::try_from(u).ok();
            }
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
                Some(f as u32)
            } else {
                None
            }
        }
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Per-seat chip and card state for one heads-up match.
#[derive(Debug, Clone, Serialize)]
pub struct Seat {
    stack: u32,
    /// Chips committed on the current street.
    bet: u32,
    /// Chips committed over the whole hand.
    invested: u32,
    hole: [Option<Card>; 2],
}

impl Seat {
    pub fn new(stack: u32) -> Self {
        Self {
            stack,
            bet: 0,
            invested: 0,
            hole: [None, None],
        }
    }

    pub fn stack(&self) -> u32 {
        self.stack
    }

    pub fn bet(&self) -> u32 {
        self.bet
    }

    pub fn invested(&self) -> u32 {
        self.invested
    }

    pub fn hole_cards(&self) -> [Option<Card>; 2] {
        self.hole
    }

    pub fn is_all_in(&self) -> bool {
        self.stack == 0
    }

    pub fn give_card(&mut self, c: Card) -> Result<(), GameError> {
        match self.hole.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(c);
                Ok(())
            }
            None => Err(GameError::IllegalAction("hole cards already dealt".into())),
        }
    }

    /// Move up to `amount` chips from the stack into the current bet and
    /// return how many actually moved.
    pub fn commit(&mut self, amount: u32) -> u32 {
        let moved = amount.min(self.stack);
        self.stack -= moved;
        self.bet += moved;
        self.invested += moved;
        moved
    }

    /// Take back chips from the current bet that were never called.
    pub fn refund(&mut self, amount: u32) {
        let amount = amount.min(self.bet);
        self.bet -= amount;
        self.invested -= amount;
        self.stack += amount;
    }

    pub fn add_chips(&mut self, amount: u32) {
        self.stack = self.stack.saturating_add(amount);
    }

    pub fn end_street(&mut self) {
        self.bet = 0;
    }

    pub fn clear_hand(&mut self) {
        self.bet = 0;
        self.invested = 0;
        self.hole = [None, None];
    }
}
