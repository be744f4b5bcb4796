use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::cards::{format_cards, Card};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::game::{Game, Highlight, PlayerId, Scores, ValidationResult};
use crate::hand::{compare_hands, evaluate_hand};
use crate::history::{ActionRecord, HandEnding, HandRecord, ShowdownHand, Street};
use crate::player::{Action, ActionKind, Position, Seat};
use crate::rules::{blinds_for_level, BettingView, RaiseBounds};

/// Number of previous pots averaged for the big-pot highlight.
const TRAILING_POTS: usize = 10;
/// Minimum settled hands before a pot can count as unusually big.
const MIN_POTS_FOR_AVERAGE: usize = 3;
const BIG_POT_FACTOR: u32 = 3;
/// Largest accepted starting stack: four stacks' worth of chips must fit in
/// a `u32` for pot-limit raise bounds.
pub const MAX_STARTING_STACK: u32 = u32::MAX / 4;

/// Table settings for one heads-up match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldemConfig {
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    /// The match ends after this many hands even if nobody is bust.
    pub max_hands: u32,
    /// Advance the blind level every N hands; fixed blinds when unset.
    pub level_up_every: Option<u32>,
}

impl Default for HoldemConfig {
    fn default() -> Self {
        Self {
            starting_stack: 1_000,
            small_blind: 5,
            big_blind: 10,
            max_hands: 40,
            level_up_every: None,
        }
    }
}

impl HoldemConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.starting_stack == 0 {
            return Err(GameError::InvalidConfig("starting_stack must be >0".into()));
        }
        if self.starting_stack > MAX_STARTING_STACK {
            return Err(GameError::InvalidConfig(format!(
                "starting_stack must be <={}",
                MAX_STARTING_STACK
            )));
        }
        if self.small_blind == 0 || self.big_blind < self.small_blind {
            return Err(GameError::InvalidConfig(
                "blinds must satisfy 0 < small_blind <= big_blind".into(),
            ));
        }
        if self.max_hands == 0 {
            return Err(GameError::InvalidConfig("max_hands must be >=1".into()));
        }
        if self.level_up_every == Some(0) {
            return Err(GameError::InvalidConfig("level_up_every must be >=1".into()));
        }
        Ok(())
    }

    fn level_for_hand(&self, hand_number: u32) -> u32 {
        match self.level_up_every {
            Some(every) => (hand_number.saturating_sub(1) / every) + 1,
            None => 1,
        }
    }
}

/// Heads-up pot-limit Texas Hold'em played over a series of hands.
///
/// Seat 0 deals the first hand and the button alternates from hand 2 on.
/// Chips are conserved at every step: both stacks plus the pot always equal
/// [`HoldemEngine::total_chips`].
///
/// # Examples
///
/// ```
/// use arena_engine::engine::{HoldemConfig, HoldemEngine};
/// use arena_engine::game::Game;
/// use arena_engine::player::Action;
///
/// let config = HoldemConfig { starting_stack: 200, small_blind: 1, big_blind: 2, ..Default::default() };
/// let mut engine = HoldemEngine::new("alice", "bob", config, 7).unwrap();
/// assert_eq!(engine.current_player(), Some("alice"));
/// assert_eq!(engine.pot(), 3);
///
/// engine.apply_action("alice", &Action::call()).unwrap();
/// assert_eq!(engine.board().len(), 3);
/// assert_eq!(engine.current_player(), Some("bob"));
/// ```
#[derive(Debug, Clone)]
pub struct HoldemEngine {
    config: HoldemConfig,
    event: String,
    players: [PlayerId; 2],
    seats: [Seat; 2],
    deck: Deck,
    seed: u64,
    board: Vec<Card>,
    pot: u32,
    street: Street,
    dealer: usize,
    current: usize,
    acted: [bool; 2],
    last_raise_size: u32,
    small_blind: u32,
    big_blind: u32,
    hand_number: u32,
    actions: Vec<ActionRecord>,
    /// Seat and street of the last raise this hand.
    last_raise: Option<(usize, Street)>,
    hand_all_in: bool,
    history: Vec<HandRecord>,
    recent_pots: VecDeque<u32>,
    highlights: Vec<Highlight>,
    terminal: bool,
}

impl HoldemEngine {
    pub fn new(
        player_a: impl Into<String>,
        player_b: impl Into<String>,
        config: HoldemConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let players = [player_a.into(), player_b.into()];
        if players[0] == players[1] {
            return Err(GameError::InvalidConfig("player ids must differ".into()));
        }
        let mut engine = Self {
            seats: [Seat::new(config.starting_stack), Seat::new(config.starting_stack)],
            event: "holdem".to_string(),
            players,
            deck: Deck::new_with_seed(seed),
            seed,
            board: Vec::with_capacity(5),
            pot: 0,
            street: Street::Preflop,
            dealer: 0,
            current: 0,
            acted: [false; 2],
            last_raise_size: config.big_blind,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            hand_number: 0,
            actions: Vec::new(),
            last_raise: None,
            hand_all_in: false,
            history: Vec::new(),
            recent_pots: VecDeque::with_capacity(TRAILING_POTS),
            highlights: Vec::new(),
            terminal: false,
            config,
        };
        engine.reset(seed)?;
        Ok(engine)
    }

    pub fn with_event_name(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    pub fn config(&self) -> &HoldemConfig {
        &self.config
    }

    pub fn total_chips(&self) -> u32 {
        self.config.starting_stack * 2
    }

    pub fn pot(&self) -> u32 {
        self.pot
    }

    pub fn street(&self) -> Street {
        self.street
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn hand_number(&self) -> u32 {
        self.hand_number
    }

    pub fn blinds(&self) -> (u32, u32) {
        (self.small_blind, self.big_blind)
    }

    pub fn history(&self) -> &[HandRecord] {
        &self.history
    }

    pub fn dealer(&self) -> &str {
        &self.players[self.dealer]
    }

    pub fn seat(&self, player: &str) -> Option<&Seat> {
        self.seat_index(player).ok().map(|i| &self.seats[i])
    }

    pub fn stack(&self, player: &str) -> Option<u32> {
        self.seat(player).map(Seat::stack)
    }

    pub fn position(&self, player: &str) -> Option<Position> {
        let i = self.seat_index(player).ok()?;
        Some(if i == self.dealer {
            Position::Button
        } else {
            Position::BigBlind
        })
    }

    pub fn has_acted(&self, player: &str) -> bool {
        self.seat_index(player)
            .map(|i| self.acted[i])
            .unwrap_or(false)
    }

    pub fn call_amount(&self, player: &str) -> Option<u32> {
        let i = self.seat_index(player).ok()?;
        Some(self.view(i).call_amount())
    }

    pub fn raise_bounds(&self, player: &str) -> Option<RaiseBounds> {
        let i = self.seat_index(player).ok()?;
        self.view(i).raise_bounds()
    }

    fn seat_index(&self, player: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))
    }

    fn view(&self, i: usize) -> BettingView {
        let o = 1 - i;
        BettingView {
            own_bet: self.seats[i].bet(),
            own_stack: self.seats[i].stack(),
            opponent_bet: self.seats[o].bet(),
            opponent_stack: self.seats[o].stack(),
            pot: self.pot,
            last_raise_size: self.last_raise_size,
            big_blind: self.big_blind,
        }
    }

    fn draw(&mut self) -> Result<Card, GameError> {
        self.deck.deal_card().ok_or(GameError::DeckExhausted)
    }

    fn commit(&mut self, i: usize, amount: u32) -> u32 {
        let moved = self.seats[i].commit(amount);
        self.pot += moved;
        moved
    }

    fn start_hand(&mut self) -> Result<(), GameError> {
        self.hand_number += 1;
        if self.hand_number > 1 {
            self.dealer = 1 - self.dealer;
        }
        let level = self.config.level_for_hand(self.hand_number);
        (self.small_blind, self.big_blind) =
            blinds_for_level(level, self.config.small_blind, self.config.big_blind);

        for seat in &mut self.seats {
            seat.clear_hand();
        }
        self.board.clear();
        self.actions.clear();
        self.last_raise = None;
        self.hand_all_in = false;
        self.street = Street::Preflop;
        self.deck.shuffle();

        let (d, b) = (self.dealer, 1 - self.dealer);
        self.commit(d, self.small_blind);
        self.commit(b, self.big_blind);
        for _ in 0..2 {
            for i in [b, d] {
                let card = self.draw()?;
                self.seats[i].give_card(card)?;
            }
        }

        self.last_raise_size = self.big_blind;
        // the posted big blind counts as that seat's preflop action
        self.acted = [false; 2];
        self.acted[b] = true;
        self.current = d;

        if self.seats.iter().any(Seat::is_all_in) {
            self.hand_all_in = true;
            self.return_uncalled();
            return self.showdown();
        }
        Ok(())
    }

    fn record(&mut self, i: usize, action: ActionKind, committed: u32, forfeited: bool) {
        self.actions.push(ActionRecord {
            player: self.players[i].clone(),
            street: self.street,
            action,
            committed,
            forfeited,
        });
    }

    fn act(&mut self, i: usize, kind: ActionKind, forfeited: bool) -> Result<(), GameError> {
        let o = 1 - i;
        match kind {
            ActionKind::Fold => {
                self.record(i, kind, 0, forfeited);
                if self.street == Street::River
                    && self.last_raise == Some((o, Street::River))
                {
                    self.highlights.push(Highlight {
                        round: self.hand_number,
                        kind: "river_fold".into(),
                        description: format!(
                            "{} folded the river to a raise from {}",
                            self.players[i], self.players[o]
                        ),
                    });
                }
                let mut payouts = [0u32; 2];
                payouts[o] = self.pot;
                return self.settle(HandEnding::Fold, payouts, Vec::new());
            }
            ActionKind::Call => {
                let amount = self.view(i).call_amount();
                let moved = self.commit(i, amount);
                self.record(i, kind, moved, forfeited);
                self.acted[i] = true;
            }
            ActionKind::Raise(to) => {
                let opponent_bet = self.seats[o].bet();
                let moved = self.commit(i, to.saturating_sub(self.seats[i].bet()));
                let raise_size = self.seats[i].bet().saturating_sub(opponent_bet);
                if raise_size >= self.last_raise_size.max(self.big_blind) {
                    self.last_raise_size = raise_size;
                }
                self.record(i, kind, moved, forfeited);
                self.acted = [false; 2];
                self.acted[i] = true;
                self.last_raise = Some((i, self.street));
            }
        }

        if self.seats.iter().any(Seat::is_all_in) {
            self.hand_all_in = true;
        }
        let bets_settled = self.seats[0].bet() == self.seats[1].bet()
            || self.seats.iter().any(Seat::is_all_in);
        if self.acted[0] && self.acted[1] && bets_settled {
            self.close_street()
        } else {
            self.current = o;
            Ok(())
        }
    }

    /// Give back the part of the larger bet the other seat never matched.
    fn return_uncalled(&mut self) {
        let (b0, b1) = (self.seats[0].bet(), self.seats[1].bet());
        let (hi, excess) = if b0 > b1 { (0, b0 - b1) } else { (1, b1 - b0) };
        if excess > 0 {
            self.seats[hi].refund(excess);
            self.pot -= excess;
        }
    }

    fn close_street(&mut self) -> Result<(), GameError> {
        self.return_uncalled();
        if self.street == Street::River || self.seats.iter().any(Seat::is_all_in) {
            return self.showdown();
        }
        self.street = self.street.next();
        self.deal_board_to(self.street.board_len())?;
        for seat in &mut self.seats {
            seat.end_street();
        }
        self.acted = [false; 2];
        self.last_raise_size = 0;
        self.current = 1 - self.dealer;
        Ok(())
    }

    fn deal_board_to(&mut self, len: usize) -> Result<(), GameError> {
        while self.board.len() < len {
            // burn before the flop, the turn and the river
            if matches!(self.board.len(), 0 | 3 | 4) {
                self.deck.burn_card();
            }
            let target = if self.board.is_empty() { 3 } else { self.board.len() + 1 };
            while self.board.len() < target {
                let card = self.draw()?;
                self.board.push(card);
            }
        }
        Ok(())
    }

    fn showdown(&mut self) -> Result<(), GameError> {
        self.deal_board_to(5)?;
        let mut revealed = Vec::with_capacity(2);
        let mut strengths = Vec::with_capacity(2);
        for (i, seat) in self.seats.iter().enumerate() {
            let hole: Vec<Card> = seat.hole_cards().iter().flatten().copied().collect();
            let mut cards = hole.clone();
            cards.extend_from_slice(&self.board);
            let strength = evaluate_hand(&cards);
            revealed.push(ShowdownHand {
                player: self.players[i].clone(),
                hole,
                category: strength.category,
            });
            strengths.push(strength);
        }

        let mut payouts = [0u32; 2];
        match compare_hands(&strengths[0], &strengths[1]) {
            std::cmp::Ordering::Greater => payouts[0] = self.pot,
            std::cmp::Ordering::Less => payouts[1] = self.pot,
            std::cmp::Ordering::Equal => {
                let big_blind_seat = 1 - self.dealer;
                payouts = [self.pot / 2; 2];
                payouts[big_blind_seat] += self.pot % 2;
            }
        }
        self.settle(HandEnding::Showdown, payouts, revealed)
    }

    fn settle(
        &mut self,
        ending: HandEnding,
        payouts: [u32; 2],
        showdown: Vec<ShowdownHand>,
    ) -> Result<(), GameError> {
        let pot = self.pot;
        for (seat, amount) in self.seats.iter_mut().zip(payouts) {
            seat.add_chips(amount);
            seat.end_street();
        }
        self.pot = 0;

        self.note_hand_highlights(pot);
        let winners = (0..2)
            .filter(|&i| payouts[i] > 0)
            .map(|i| self.players[i].clone())
            .collect();
        self.history.push(HandRecord {
            hand_number: self.hand_number,
            dealer: self.players[self.dealer].clone(),
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            board: self.board.clone(),
            actions: std::mem::take(&mut self.actions),
            pot,
            ending,
            winners,
            payouts,
            showdown,
            all_in: self.hand_all_in,
        });

        if self.seats.iter().any(|s| s.stack() == 0) || self.hand_number >= self.config.max_hands {
            self.terminal = true;
            self.street = Street::Showdown;
            return Ok(());
        }
        self.start_hand()
    }

    fn note_hand_highlights(&mut self, pot: u32) {
        if self.recent_pots.len() >= MIN_POTS_FOR_AVERAGE {
            let sum: u32 = self.recent_pots.iter().sum();
            let average = sum / self.recent_pots.len() as u32;
            if pot > average.saturating_mul(BIG_POT_FACTOR) {
                self.highlights.push(Highlight {
                    round: self.hand_number,
                    kind: "big_pot".into(),
                    description: format!("pot of {} against a trailing average of {}", pot, average),
                });
            }
        }
        if self.recent_pots.len() == TRAILING_POTS {
            self.recent_pots.pop_front();
        }
        self.recent_pots.push_back(pot);

        if self.hand_all_in {
            self.highlights.push(Highlight {
                round: self.hand_number,
                kind: "all_in".into(),
                description: format!("a player was all-in in hand {}", self.hand_number),
            });
        }
    }

    fn legal_action_lines(&self, i: usize) -> Vec<String> {
        let view = self.view(i);
        let mut lines = vec!["- fold".to_string()];
        let call = view.call_amount();
        if call == 0 {
            lines.push("- call (cost: 0) (a check)".to_string());
        } else {
            lines.push(format!("- call (cost: {})", call));
        }
        if let Some(b) = view.raise_bounds() {
            lines.push(format!("- raise (to: {}-{})", b.min_to, b.max_to));
        }
        lines
    }
}

impl Game for HoldemEngine {
    type Action = Action;

    fn event_name(&self) -> &str {
        &self.event
    }

    fn players(&self) -> &[PlayerId] {
        &self.players
    }

    fn reset(&mut self, seed: u64) -> Result<(), GameError> {
        self.seed = seed;
        self.deck = Deck::new_with_seed(seed);
        self.seats = [
            Seat::new(self.config.starting_stack),
            Seat::new(self.config.starting_stack),
        ];
        self.pot = 0;
        self.dealer = 0;
        self.hand_number = 0;
        self.history.clear();
        self.recent_pots.clear();
        self.highlights.clear();
        self.terminal = false;
        self.start_hand()
    }

    fn current_player(&self) -> Option<&str> {
        if self.terminal {
            None
        } else {
            Some(&self.players[self.current])
        }
    }

    fn get_prompt(&self, player: &str) -> String {
        let Ok(i) = self.seat_index(player) else {
            return format!("{} is not seated in this match.", player);
        };
        let o = 1 - i;
        let me = &self.seats[i];
        let opp = &self.seats[o];
        let hole: Vec<Card> = me.hole_cards().iter().flatten().copied().collect();
        let position = if i == self.dealer {
            "dealer (small blind)"
        } else {
            "big blind"
        };

        let mut p = String::new();
        p.push_str(&format!(
            "You are {} in a heads-up pot-limit Texas Hold'em match against {}.\n",
            player, self.players[o]
        ));
        p.push_str(&format!(
            "Hand {} of {}. Blinds {}/{}. You are the {}.\n",
            self.hand_number, self.config.max_hands, self.small_blind, self.big_blind, position
        ));
        p.push_str(&format!("Street: {:?}\n", self.street));
        p.push_str(&format!("Your hole cards: {}\n", format_cards(&hole)));
        p.push_str(&format!("Board: {}\n", format_cards(&self.board)));
        p.push_str(&format!("Pot: {}\n", self.pot));
        p.push_str(&format!(
            "Your stack: {} (bet this street: {})\n",
            me.stack(),
            me.bet()
        ));
        p.push_str(&format!(
            "Opponent stack: {} (bet this street: {})\n",
            opp.stack(),
            opp.bet()
        ));
        if !self.actions.is_empty() {
            p.push_str("Actions this hand:\n");
            for a in &self.actions {
                p.push_str(&format!(
                    "  {} {:?}: {} ({} chips)\n",
                    a.player, a.street, a.action, a.committed
                ));
            }
        }
        p.push_str("Legal actions:\n");
        for line in self.legal_action_lines(i) {
            p.push_str(&line);
            p.push('\n');
        }
        p.push_str(
            "Raise amounts are the total you will have bet this street, not the increment.\n\
             Respond with exactly one JSON object: \
             {\"action\": \"fold\" | \"call\" | \"raise\", \"amount\": <raise-to total, raise only>, \
             \"reasoning\": \"<one sentence>\"}\n",
        );
        p
    }

    fn validate_action(&self, player: &str, action: &Action) -> ValidationResult {
        if self.terminal {
            return ValidationResult::illegal("the match is over");
        }
        let Ok(i) = self.seat_index(player) else {
            return ValidationResult::illegal(format!("{} is not in this match", player));
        };
        if i != self.current {
            return ValidationResult::illegal(format!(
                "it is {}'s turn, not {}'s",
                self.players[self.current], player
            ));
        }
        match self.view(i).check(action.kind) {
            Ok(()) => ValidationResult::legal(),
            Err(reason) => ValidationResult::illegal(reason),
        }
    }

    fn apply_action(&mut self, player: &str, action: &Action) -> Result<(), GameError> {
        if self.terminal {
            return Err(GameError::MatchOver);
        }
        let i = self.seat_index(player)?;
        if i != self.current {
            return Err(GameError::NotPlayersTurn {
                expected: self.players[self.current].clone(),
                actual: player.to_string(),
            });
        }
        self.view(i)
            .check(action.kind)
            .map_err(GameError::IllegalAction)?;
        self.act(i, action.kind, false)
    }

    fn forfeit_turn(&mut self, player: &str) -> Result<Action, GameError> {
        if self.terminal {
            return Err(GameError::MatchOver);
        }
        let i = self.seat_index(player)?;
        if i != self.current {
            return Err(GameError::NotPlayersTurn {
                expected: self.players[self.current].clone(),
                actual: player.to_string(),
            });
        }
        // checking is free, so never fold when nothing is owed
        let kind = if self.view(i).call_amount() == 0 {
            ActionKind::Call
        } else {
            ActionKind::Fold
        };
        self.act(i, kind, true)?;
        Ok(Action::from(kind))
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn get_scores(&self) -> Scores {
        self.players
            .iter()
            .zip(&self.seats)
            .map(|(p, s)| (p.clone(), f64::from(s.stack())))
            .collect()
    }

    fn get_state_snapshot(&self) -> serde_json::Value {
        let seats: Vec<SeatSnapshot<'_>> = (0..2)
            .map(|i| SeatSnapshot {
                player: &self.players[i],
                stack: self.seats[i].stack(),
                bet: self.seats[i].bet(),
                invested: self.seats[i].invested(),
                hole_cards: self.seats[i].hole_cards().iter().flatten().copied().collect(),
                has_acted: self.acted[i],
                all_in: self.seats[i].is_all_in(),
            })
            .collect();
        let snapshot = Snapshot {
            event: &self.event,
            seed: self.seed,
            hand_number: self.hand_number,
            max_hands: self.config.max_hands,
            street: self.street,
            dealer: &self.players[self.dealer],
            current_player: self.current_player(),
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            pot: self.pot,
            total_chips: self.total_chips(),
            board: &self.board,
            seats,
            last_raise_size: self.last_raise_size,
            actions: &self.actions,
            deck_remaining: self.deck.remaining(),
            history: &self.history,
            terminal: self.terminal,
        };
        serde_json::to_value(snapshot).unwrap_or_default()
    }

    fn action_identity(&self, action: &Action) -> String {
        action.kind.to_string()
    }

    fn highlights(&self) -> Vec<Highlight> {
        self.highlights.clone()
    }

    fn forfeit_scores(&self, loser: &str) -> Scores {
        self.players
            .iter()
            .map(|p| {
                let chips = if p == loser { 0 } else { self.total_chips() };
                (p.clone(), f64::from(chips))
            })
            .collect()
    }
}

#[derive(Serialize)]
struct SeatSnapshot<'a> {
    player: &'a str,
    stack: u32,
    bet: u32,
    invested: u32,
    hole_cards: Vec<Card>,
    has_acted: bool,
    all_in: bool,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    event: &'a str,
    seed: u64,
    hand_number: u32,
    max_hands: u32,
    street: Street,
    dealer: &'a str,
    current_player: Option<&'a str>,
    small_blind: u32,
    big_blind: u32,
    pot: u32,
    total_chips: u32,
    board: &'a [Card],
    seats: Vec<SeatSnapshot<'a>>,
    last_raise_size: u32,
    actions: &'a [ActionRecord],
    deck_remaining: usize,
    history: &'a [HandRecord],
    terminal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn engine(stack: u32, sb: u32, bb: u32, seed: u64) -> HoldemEngine {
        let config = HoldemConfig {
            starting_stack: stack,
            small_blind: sb,
            big_blind: bb,
            max_hands: 200,
            level_up_every: None,
        };
        HoldemEngine::new("a", "b", config, seed).unwrap()
    }

    fn conserved(e: &HoldemEngine) -> bool {
        e.seats[0].stack() + e.seats[1].stack() + e.pot == e.total_chips()
    }

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn raise_resets_opponents_acted_flag_and_passes_the_turn() {
        let mut e = engine(200, 1, 2, 3);
        e.apply_action("a", &Action::call()).unwrap();
        // flop, big blind first
        assert_eq!(e.current_player(), Some("b"));
        e.apply_action("b", &Action::call()).unwrap();
        assert!(e.has_acted("b"));
        assert_eq!(e.current_player(), Some("a"));
        e.apply_action("a", &Action::raise_to(4)).unwrap();
        assert!(!e.has_acted("b"));
        assert!(e.has_acted("a"));
        assert_eq!(e.current_player(), Some("b"));
        assert_eq!(e.street(), Street::Flop);
    }

    #[test]
    fn pot_sized_raises_reach_all_in_and_run_out() {
        let mut e = engine(100, 1, 2, 11);
        e.apply_action("a", &Action::raise_to(6)).unwrap();
        e.apply_action("b", &Action::raise_to(18)).unwrap();
        e.apply_action("a", &Action::raise_to(54)).unwrap();
        let bounds = e.raise_bounds("b").unwrap();
        assert_eq!(bounds.max_to, 100);
        e.apply_action("b", &Action::raise_to(100)).unwrap();
        assert!(conserved(&e));
        e.apply_action("a", &Action::call()).unwrap();
        assert!(conserved(&e));
        let record = &e.history()[0];
        assert!(record.all_in);
        assert_eq!(record.pot, 200);
        assert_eq!(record.ending, HandEnding::Showdown);
        assert_eq!(record.board.len(), 5);
    }

    #[test]
    fn uncalled_excess_is_returned_to_the_bigger_stack() {
        let mut e = engine(200, 1, 2, 11);
        e.seats[0] = Seat::new(347);
        e.seats[0].commit(1);
        e.seats[1] = Seat::new(53);
        e.seats[1].commit(2);
        for c in ["2c", "7d"] {
            e.seats[0].give_card(card(c)).unwrap();
        }
        for c in ["3h", "8s"] {
            e.seats[1].give_card(card(c)).unwrap();
        }
        assert!(conserved(&e));

        e.apply_action("a", &Action::raise_to(6)).unwrap();
        e.apply_action("b", &Action::raise_to(18)).unwrap();
        e.apply_action("a", &Action::raise_to(54)).unwrap();
        // b covers only 35 more: calling is all it can do
        assert_eq!(e.call_amount("b"), Some(35));
        assert!(e.raise_bounds("b").is_none());
        e.apply_action("b", &Action::call()).unwrap();

        let record = &e.history()[0];
        assert_eq!(record.pot, 106);
        assert_eq!(record.payouts.iter().sum::<u32>(), 106);
        assert!(conserved(&e));
    }

    #[test]
    fn split_pot_odd_chip_goes_to_big_blind() {
        let mut e = engine(100, 1, 2, 5);
        // rig a board that plays for both seats
        e.seats[0].clear_hand();
        e.seats[1].clear_hand();
        for c in ["2c", "3d"] {
            e.seats[0].give_card(card(c)).unwrap();
        }
        for c in ["2h", "3s"] {
            e.seats[1].give_card(card(c)).unwrap();
        }
        e.board = ["Ah", "Kd", "Qc", "Js", "Tc"].iter().map(|c| card(c)).collect();
        // odd pot: add a single dead chip from seat 0
        e.commit(0, 2);
        assert_eq!(e.pot, 5);
        e.showdown().unwrap();
        let record = &e.history()[0];
        assert_eq!(record.winners.len(), 2);
        let big_blind_seat = 1; // seat 0 dealt hand 1
        assert_eq!(record.payouts[big_blind_seat], 3);
        assert_eq!(record.payouts[0], 2);
        assert!(conserved(&e));
    }

    #[test]
    fn dealer_alternates_from_second_hand() {
        let mut e = engine(200, 1, 2, 9);
        assert_eq!(e.dealer(), "a");
        e.apply_action("a", &Action::fold()).unwrap();
        assert_eq!(e.hand_number(), 2);
        assert_eq!(e.dealer(), "b");
        assert_eq!(e.current_player(), Some("b"));
        assert_eq!(e.stack("a"), Some(199 - 2));
    }

    #[test]
    fn blind_all_in_runs_the_board_out() {
        let mut e = engine(200, 1, 2, 21);
        e.seats[0] = Seat::new(1);
        e.seats[1] = Seat::new(399);
        e.pot = 0;
        e.dealer = 1; // seat 0 deals the next hand
        e.hand_number = 1;
        e.start_hand().unwrap();
        let first = &e.history()[0];
        assert!(first.all_in);
        assert_eq!(first.board.len(), 5);
        assert_eq!(first.pot, 2);
        assert!(conserved(&e));
    }

    #[test]
    fn random_legal_play_conserves_chips() {
        for seed in 0..40u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut e = engine(300, 2, 4, seed);
            let mut steps = 0;
            while let Some(p) = e.current_player().map(str::to_string) {
                let choice = rng.random_range(0..10);
                let action = match (choice, e.raise_bounds(&p)) {
                    (0, _) => Action::fold(),
                    (1..=3, Some(b)) => Action::raise_to(rng.random_range(b.min_to..=b.max_to)),
                    _ => Action::call(),
                };
                assert!(e.validate_action(&p, &action).is_legal());
                e.apply_action(&p, &action).unwrap();
                assert!(conserved(&e), "seed {} step {}", seed, steps);
                steps += 1;
                assert!(steps < 10_000);
            }
            assert!(e.is_terminal());
            let total: f64 = e.get_scores().values().sum();
            assert_eq!(total, f64::from(e.total_chips()));
        }
    }

    #[test]
    fn rigged_flush_wins_at_showdown() {
        let mut e = engine(100, 1, 2, 1);
        e.seats[0].clear_hand();
        e.seats[1].clear_hand();
        e.seats[0]
            .give_card(Card { rank: Rank::Two, suit: Suit::Hearts })
            .unwrap();
        e.seats[0]
            .give_card(Card { rank: Rank::Three, suit: Suit::Hearts })
            .unwrap();
        e.seats[1].give_card(card("Ac")).unwrap();
        e.seats[1].give_card(card("Ad")).unwrap();
        e.board = ["9h", "Jh", "Kh", "As", "4c"].iter().map(|c| card(c)).collect();
        e.showdown().unwrap();
        assert_eq!(e.history()[0].winners, vec!["a".to_string()]);
        assert_eq!(e.stack("a"), Some(102));
    }
}
