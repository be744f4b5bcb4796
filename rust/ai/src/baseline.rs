//! Rule-based hold'em player that works from the prompt text alone.
//!
//! The baseline never sees engine state. It reads the same prompt a language
//! model would get, pulls out the hole cards, board, pot and legal-action
//! lines, and answers in the JSON action format. Decisions are fully
//! deterministic so matches against it replay exactly.

use std::time::Duration;

use arena_engine::cards::Card;
use arena_engine::hand::{evaluate_hand, Category};
use serde_json::json;

use crate::{AdapterError, ModelAdapter, ModelResponse};

/// The parts of a hold'em prompt the baseline acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptView {
    pub hole: Vec<Card>,
    pub board: Vec<Card>,
    pub pot: u32,
    /// Cost of the `call` line, `None` when the prompt offers no call.
    pub call_cost: Option<u32>,
    /// Inclusive raise-to range from the `raise` line.
    pub raise: Option<(u32, u32)>,
}

impl PromptView {
    /// Pull what the baseline needs out of a prompt. Unknown lines are
    /// ignored, so a partial prompt yields a partial view.
    ///
    /// ```
    /// use arena_models::baseline::PromptView;
    ///
    /// let view = PromptView::parse("Pot: 12\n- call (cost: 4)\n- raise (to: 12-28)\n");
    /// assert_eq!(view.pot, 12);
    /// assert_eq!(view.call_cost, Some(4));
    /// assert_eq!(view.raise, Some((12, 28)));
    /// ```
    pub fn parse(prompt: &str) -> Self {
        let mut view = PromptView::default();
        for line in prompt.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("Your hole cards:") {
                view.hole = parse_cards(rest);
            } else if let Some(rest) = line.strip_prefix("Board:") {
                view.board = parse_cards(rest);
            } else if let Some(rest) = line.strip_prefix("Pot:") {
                view.pot = leading_number(rest).unwrap_or(0);
            } else if let Some(rest) = line.strip_prefix("- call (cost:") {
                view.call_cost = leading_number(rest);
            } else if let Some(rest) = line.strip_prefix("- raise (to:") {
                let range = rest.trim().trim_end_matches(')');
                if let Some((lo, hi)) = range.split_once('-') {
                    if let (Some(lo), Some(hi)) = (leading_number(lo), leading_number(hi)) {
                        view.raise = Some((lo, hi));
                    }
                }
            }
        }
        view
    }
}

fn parse_cards(text: &str) -> Vec<Card> {
    text.split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// What the baseline decided, before rendering to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fold,
    Call,
    Raise(u32),
}

/// Deterministic rule-based player.
///
/// Preflop it rates the two hole cards on a 0-10 scale; postflop it rates
/// the made hand. Strong hands raise inside the offered range, medium hands
/// call when the price is right, weak hands check or fold.
#[derive(Debug, Clone, Default)]
pub struct BaselineAdapter;

impl BaselineAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Rate two hole cards on a 0-10 scale.
    fn preflop_strength(hole: [Card; 2]) -> u8 {
        let (r1, r2) = (hole[0].rank.value(), hole[1].rank.value());
        let (high, low) = if r1 >= r2 { (r1, r2) } else { (r2, r1) };
        let suited = hole[0].suit == hole[1].suit;
        let bonus = |s: u8| if suited { s + 1 } else { s };

        if high == low {
            return match high {
                13..=14 => 10,
                11..=12 => 9,
                10 => 8,
                9 => 7,
                8 => 6,
                7 => 5,
                _ => 4,
            };
        }
        match (high, low) {
            (14, 13) => {
                if suited {
                    10
                } else {
                    8
                }
            }
            (14, 12) => bonus(7),
            (14, 11) | (13, 12) => bonus(6),
            (14, 10) | (13, 11) | (12, 11) => bonus(5),
            (14, _) | (13, 10) | (12, 10) => bonus(4),
            _ if suited && high - low <= 2 => {
                if high >= 9 {
                    5
                } else {
                    4
                }
            }
            _ if high >= 11 && low >= 9 => 4,
            _ => 2,
        }
    }

    /// Rate the best made hand on a 0-10 scale, `None` before the flop.
    fn postflop_strength(hole: &[Card], board: &[Card]) -> Option<u8> {
        if board.len() < 3 {
            return None;
        }
        let mut cards = hole.to_vec();
        cards.extend_from_slice(board);
        let strength = evaluate_hand(&cards);
        let base = match strength.category {
            Category::HighCard => 1,
            Category::OnePair => 3,
            Category::TwoPair => 5,
            Category::ThreeOfAKind => 6,
            Category::Straight => 7,
            Category::Flush => 8,
            Category::FullHouse => 9,
            Category::FourOfAKind | Category::StraightFlush => 10,
        };
        let kicker = u8::from(strength.kickers[0] >= 12);
        Some((base + kicker).min(10))
    }

    pub fn strength(view: &PromptView) -> Option<u8> {
        let [a, b] = view.hole.as_slice() else {
            return None;
        };
        Some(
            Self::postflop_strength(&view.hole, &view.board)
                .unwrap_or_else(|| Self::preflop_strength([*a, *b])),
        )
    }

    pub fn decide(view: &PromptView) -> Decision {
        let call = view.call_cost.unwrap_or(0);
        let Some(strength) = Self::strength(view) else {
            return if call == 0 { Decision::Call } else { Decision::Fold };
        };

        let raise_to = |share_of_range: u32| {
            view.raise
                .map(|(lo, hi)| Decision::Raise(lo + (hi - lo) * share_of_range / 4))
        };

        if call == 0 {
            return match strength {
                9..=10 => raise_to(2).unwrap_or(Decision::Call),
                7..=8 => raise_to(0).unwrap_or(Decision::Call),
                _ => Decision::Call,
            };
        }

        // share of the final pot we would be paying
        let price = f64::from(call) / f64::from(view.pot + call);
        match strength {
            9..=10 => raise_to(2).unwrap_or(Decision::Call),
            7..=8 => Decision::Call,
            5..=6 if price <= 0.35 => Decision::Call,
            3..=4 if price <= 0.25 => Decision::Call,
            _ => Decision::Fold,
        }
    }

    fn render(decision: Decision, strength: Option<u8>) -> String {
        let reasoning = match strength {
            Some(s) => format!("hand strength {}/10", s),
            None => "no cards visible".to_string(),
        };
        let value = match decision {
            Decision::Fold => json!({"action": "fold", "reasoning": reasoning}),
            Decision::Call => json!({"action": "call", "reasoning": reasoning}),
            Decision::Raise(to) => json!({"action": "raise", "amount": to, "reasoning": reasoning}),
        };
        value.to_string()
    }

    /// Full JSON answer for a prompt.
    pub fn answer(prompt: &str) -> String {
        let view = PromptView::parse(prompt);
        Self::render(Self::decide(&view), Self::strength(&view))
    }
}

impl ModelAdapter for BaselineAdapter {
    fn model_id(&self) -> &str {
        "baseline"
    }

    fn query(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<ModelResponse, AdapterError> {
        Ok(ModelResponse::new(prompt, Self::answer(prompt), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(s: &str) -> Vec<Card> {
        parse_cards(s)
    }

    fn hole(s: &str) -> [Card; 2] {
        let c = cards(s);
        [c[0], c[1]]
    }

    #[test]
    fn premium_pairs_and_big_slick_rate_highest() {
        assert_eq!(BaselineAdapter::preflop_strength(hole("As Ah")), 10);
        assert_eq!(BaselineAdapter::preflop_strength(hole("Kd Kc")), 10);
        assert_eq!(BaselineAdapter::preflop_strength(hole("Ah Kh")), 10);
        assert_eq!(BaselineAdapter::preflop_strength(hole("Ah Ks")), 8);
    }

    #[test]
    fn weak_offsuit_rates_low() {
        assert!(BaselineAdapter::preflop_strength(hole("7h 2s")) <= 3);
        let connectors = BaselineAdapter::preflop_strength(hole("9h 8h"));
        assert!((4..=6).contains(&connectors));
    }

    #[test]
    fn postflop_uses_the_board() {
        let s = BaselineAdapter::postflop_strength(&cards("Ah As"), &cards("Ad Kc Qh Js Td"));
        assert!(s.unwrap() >= 7);
        assert_eq!(BaselineAdapter::postflop_strength(&cards("Ah As"), &[]), None);
    }

    #[test]
    fn parses_engine_style_lines() {
        let prompt = "Your hole cards: Th 9h\nBoard: -\nPot: 3\nLegal actions:\n- fold\n- call (cost: 0) (a check)\n";
        let view = PromptView::parse(prompt);
        assert_eq!(view.hole, cards("Th 9h"));
        assert!(view.board.is_empty());
        assert_eq!(view.call_cost, Some(0));
        assert_eq!(view.raise, None);
    }

    #[test]
    fn never_folds_when_checking_is_free() {
        let view = PromptView {
            hole: cards("7h 2s"),
            board: cards("Ac Kd Qs"),
            pot: 20,
            call_cost: Some(0),
            raise: Some((10, 20)),
        };
        assert_eq!(BaselineAdapter::decide(&view), Decision::Call);
    }

    #[test]
    fn raises_stay_inside_the_offered_range() {
        let view = PromptView {
            hole: cards("As Ad"),
            board: vec![],
            pot: 3,
            call_cost: Some(1),
            raise: Some((4, 6)),
        };
        assert_eq!(BaselineAdapter::decide(&view), Decision::Raise(5));
    }

    #[test]
    fn folds_weak_hands_to_big_bets() {
        let view = PromptView {
            hole: cards("7h 2s"),
            board: vec![],
            pot: 30,
            call_cost: Some(28),
            raise: None,
        };
        assert_eq!(BaselineAdapter::decide(&view), Decision::Fold);
        assert!(BaselineAdapter::answer("Pot: 10\n- call (cost: 5)\n").contains("fold"));
    }
}
