use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four suits of a standard 52-card deck.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    /// Single-letter symbol used in prompts and snapshots (`c`, `d`, `h`, `s`).
    pub fn symbol(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Rank of a card from Two through Ace. The discriminant is the rank's
/// numeric value, so `Rank::Ace as u8 == 14`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn symbol(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

/// A single playing card.
///
/// Cards render in the two-character form models are prompted with:
///
/// ```
/// use arena_engine::cards::{Card, Rank, Suit};
///
/// let card = Card { rank: Rank::Ten, suit: Suit::Hearts };
/// assert_eq!(card.to_string(), "Th");
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

impl FromStr for Card {
    type Err = String;

    /// Parse the two-character form, e.g. `As` or `td`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(r), Some(u), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("not a card: {:?}", s));
        };
        let rank = ALL_RANKS
            .into_iter()
            .find(|rank| rank.symbol() == r.to_ascii_uppercase())
            .ok_or_else(|| format!("bad rank in {:?}", s))?;
        let suit = ALL_SUITS
            .into_iter()
            .find(|suit| suit.symbol() == u.to_ascii_lowercase())
            .ok_or_else(|| format!("bad suit in {:?}", s))?;
        Ok(Card { rank, suit })
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

/// The 52 cards in suit-major order.
pub fn full_deck() -> [Card; 52] {
    let mut cards = [Card {
        rank: Rank::Two,
        suit: Suit::Clubs,
    }; 52];
    let mut i = 0;
    for suit in ALL_SUITS {
        for rank in ALL_RANKS {
            cards[i] = Card { rank, suit };
            i += 1;
        }
    }
    cards
}

/// Render a run of cards separated by spaces, or `-` when empty.
pub fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
