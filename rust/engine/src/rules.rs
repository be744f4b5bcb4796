//! Pot-limit betting arithmetic, independent of seat bookkeeping.

use serde::Serialize;

use crate::player::ActionKind;

/// Inclusive range of legal raise-to totals for the current street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RaiseBounds {
    pub min_to: u32,
    pub max_to: u32,
}

/// What one player faces when it is their turn to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BettingView {
    pub own_bet: u32,
    pub own_stack: u32,
    pub opponent_bet: u32,
    pub opponent_stack: u32,
    /// Every chip committed this hand, current-street bets included.
    pub pot: u32,
    pub last_raise_size: u32,
    pub big_blind: u32,
}

impl BettingView {
    /// `max(0, min(opponent_bet - own_bet, own_stack))`
    pub fn call_amount(&self) -> u32 {
        self.opponent_bet
            .saturating_sub(self.own_bet)
            .min(self.own_stack)
    }

    /// Legal raise-to range, or `None` when no raise is possible: the
    /// opponent is all-in, or the player cannot put in more than a call.
    ///
    /// ```
    /// use arena_engine::rules::{BettingView, RaiseBounds};
    ///
    /// // Small blind facing the big blind at 1/2 with 200 behind.
    /// let view = BettingView {
    ///     own_bet: 1,
    ///     own_stack: 199,
    ///     opponent_bet: 2,
    ///     opponent_stack: 198,
    ///     pot: 3,
    ///     last_raise_size: 2,
    ///     big_blind: 2,
    /// };
    /// assert_eq!(view.raise_bounds(), Some(RaiseBounds { min_to: 4, max_to: 6 }));
    /// ```
    pub fn raise_bounds(&self) -> Option<RaiseBounds> {
        let call = self.call_amount();
        if self.opponent_stack == 0 || self.own_stack <= call {
            return None;
        }
        let all_in_to = self.own_bet + self.own_stack;
        let min_to = self
            .opponent_bet
            .saturating_add(self.last_raise_size.max(self.big_blind));
        let max_to = self.opponent_bet.saturating_add(self.pot).saturating_add(call);
        let max_to = max_to.min(all_in_to);
        let min_to = min_to.min(all_in_to);
        // A short stack can only raise all-in, which the caps above already
        // collapse to a single amount; never let the floor pass the ceiling.
        Some(RaiseBounds {
            min_to: min_to.min(max_to),
            max_to,
        })
    }

    /// Check an action against the current street, returning the reason it
    /// is illegal.
    pub fn check(&self, kind: ActionKind) -> Result<(), String> {
        match kind {
            ActionKind::Fold | ActionKind::Call => Ok(()),
            ActionKind::Raise(to) => {
                let Some(bounds) = self.raise_bounds() else {
                    return Err(if self.opponent_stack == 0 {
                        "cannot raise: opponent is all-in; call or fold".to_string()
                    } else {
                        "cannot raise: stack does not cover more than a call".to_string()
                    });
                };
                if to < bounds.min_to || to > bounds.max_to {
                    Err(format!(
                        "raise to {} is outside the legal range {}-{} (raise amounts are the total bet for this street)",
                        to, bounds.min_to, bounds.max_to
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Blind multiplier for a level, starting at 1x on level 1.
pub fn blind_multiplier(level: u32) -> u32 {
    const SCHEDULE: [u32; 10] = [1, 2, 3, 4, 6, 8, 10, 15, 20, 30];
    let idx = level.saturating_sub(1) as usize;
    SCHEDULE.get(idx).copied().unwrap_or(SCHEDULE[SCHEDULE.len() - 1])
}

/// Blinds for `level` given the level-1 blinds.
pub fn blinds_for_level(level: u32, small_blind: u32, big_blind: u32) -> (u32, u32) {
    let m = blind_multiplier(level);
    (small_blind.saturating_mul(m), big_blind.saturating_mul(m))
}
