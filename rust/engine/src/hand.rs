//! Best-five-card hand ranking over hole cards plus board.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::Card;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::HighCard => "high card",
            Category::OnePair => "one pair",
            Category::TwoPair => "two pair",
            Category::ThreeOfAKind => "three of a kind",
            Category::Straight => "straight",
            Category::Flush => "flush",
            Category::FullHouse => "full house",
            Category::FourOfAKind => "four of a kind",
            Category::StraightFlush => "straight flush",
        }
    }
}

/// Strength of the best five-card hand. Field order makes the derived `Ord`
/// compare category first, then kickers high to low.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: Category,
    pub kickers: [u8; 5],
}

/// Rank the best five-card hand contained in `cards` (five to seven cards).
///
/// ```
/// use arena_engine::cards::{Card, Rank, Suit};
/// use arena_engine::hand::{evaluate_hand, Category};
///
/// let c = |rank, suit| Card { rank, suit };
/// let cards = [
///     c(Rank::Ace, Suit::Hearts),
///     c(Rank::King, Suit::Hearts),
///     c(Rank::Queen, Suit::Hearts),
///     c(Rank::Jack, Suit::Hearts),
///     c(Rank::Ten, Suit::Hearts),
///     c(Rank::Two, Suit::Clubs),
///     c(Rank::Three, Suit::Diamonds),
/// ];
/// assert_eq!(evaluate_hand(&cards).category, Category::StraightFlush);
/// ```
pub fn evaluate_hand(cards: &[Card]) -> HandStrength {
    let mut counts = [0u8; 15];
    let mut rank_mask = 0u16;
    let mut suit_masks = [0u16; 4];
    for card in cards {
        let r = card.rank.value();
        counts[r as usize] += 1;
        rank_mask |= 1 << r;
        suit_masks[card.suit.index()] |= 1 << r;
    }

    let flush = suit_masks.iter().copied().find(|m| m.count_ones() >= 5);
    if let Some(mask) = flush {
        if let Some(high) = straight_high(mask) {
            return strength(Category::StraightFlush, &[high]);
        }
    }

    // (count, rank) sorted by multiplicity, then rank, both descending
    let mut groups: Vec<(u8, u8)> = (2..=14u8)
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let (top_count, top_rank) = groups[0];
    let others = |exclude: &[u8]| -> Vec<u8> {
        (2..=14u8)
            .rev()
            .filter(|r| counts[*r as usize] > 0 && !exclude.contains(r))
            .collect()
    };

    if top_count == 4 {
        let kicker = others(&[top_rank]).first().copied().unwrap_or(0);
        return strength(Category::FourOfAKind, &[top_rank, kicker]);
    }
    if top_count == 3 {
        let pair = groups[1..]
            .iter()
            .filter(|(count, _)| *count >= 2)
            .map(|(_, rank)| *rank)
            .max();
        if let Some(pair) = pair {
            return strength(Category::FullHouse, &[top_rank, pair]);
        }
    }
    if let Some(mask) = flush {
        let ranks: Vec<u8> = (2..=14u8).rev().filter(|r| mask & (1 << r) != 0).collect();
        return strength(Category::Flush, &ranks);
    }
    if let Some(high) = straight_high(rank_mask) {
        return strength(Category::Straight, &[high]);
    }
    if top_count == 3 {
        let mut k = vec![top_rank];
        k.extend(others(&[top_rank]));
        return strength(Category::ThreeOfAKind, &k);
    }
    if top_count == 2 && groups.len() > 1 && groups[1].0 == 2 {
        let (high, low) = (groups[0].1, groups[1].1);
        let mut k = vec![high, low];
        k.extend(others(&[high, low]));
        return strength(Category::TwoPair, &k);
    }
    if top_count == 2 {
        let mut k = vec![top_rank];
        k.extend(others(&[top_rank]));
        return strength(Category::OnePair, &k);
    }
    strength(Category::HighCard, &others(&[]))
}

pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    a.cmp(b)
}

fn strength(category: Category, ranks: &[u8]) -> HandStrength {
    let mut kickers = [0u8; 5];
    for (slot, rank) in kickers.iter_mut().zip(ranks) {
        *slot = *rank;
    }
    HandStrength { category, kickers }
}

/// Highest card of the best straight in a rank bitmask; the wheel reports 5.
fn straight_high(mask: u16) -> Option<u8> {
    let mut m = mask;
    if m & (1 << 14) != 0 {
        m |= 1 << 1;
    }
    (5..=14u8).rev().find(|&high| {
        let window = 0b1_1111u16 << (high - 4);
        m & window == window
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    fn parse(s: &str) -> Vec<Card> {
        s.split_whitespace()
            .map(|t| {
                let mut ch = t.chars();
                let rank = match ch.next().unwrap() {
                    'A' => Rank::Ace,
                    'K' => Rank::King,
                    'Q' => Rank::Queen,
                    'J' => Rank::Jack,
                    'T' => Rank::Ten,
                    '9' => Rank::Nine,
                    '8' => Rank::Eight,
                    '7' => Rank::Seven,
                    '6' => Rank::Six,
                    '5' => Rank::Five,
                    '4' => Rank::Four,
                    '3' => Rank::Three,
                    _ => Rank::Two,
                };
                let suit = match ch.next().unwrap() {
                    'c' => Suit::Clubs,
                    'd' => Suit::Diamonds,
                    'h' => Suit::Hearts,
                    _ => Suit::Spades,
                };
                Card { rank, suit }
            })
            .collect()
    }

    #[test]
    fn wheel_is_a_five_high_straight() {
        let s = evaluate_hand(&parse("Ah 2c 3d 4s 5h Kd Qc"));
        assert_eq!(s.category, Category::Straight);
        assert_eq!(s.kickers[0], 5);
    }

    #[test]
    fn full_house_picks_best_pair_over_second_trips() {
        let s = evaluate_hand(&parse("9h 9c 9d 5s 5h 5d Kc"));
        assert_eq!(s.category, Category::FullHouse);
        assert_eq!(&s.kickers[..2], &[9, 5]);

        let s = evaluate_hand(&parse("9h 9c 9d 5s 5h Kd Kc"));
        assert_eq!(&s.kickers[..2], &[9, 13]);
    }

    #[test]
    fn two_pair_kicker_can_come_from_third_pair() {
        let s = evaluate_hand(&parse("Ah Ac Kd Ks Qh Qd 2c"));
        assert_eq!(s.category, Category::TwoPair);
        assert_eq!(&s.kickers[..3], &[14, 13, 12]);
    }

    #[test]
    fn flush_beats_straight() {
        let flush = evaluate_hand(&parse("2h 7h 9h Jh Kh Tc Qd"));
        let straight = evaluate_hand(&parse("9c Tc Jd Qs Kh 2d 3d"));
        assert_eq!(flush.category, Category::Flush);
        assert_eq!(compare_hands(&flush, &straight), Ordering::Greater);
    }

    #[test]
    fn kickers_break_ties_between_pairs() {
        let a = evaluate_hand(&parse("Ah Ac Kd 9s 7h 4d 2c"));
        let b = evaluate_hand(&parse("Ad As Qd 9c 7s 4h 2d"));
        assert_eq!(compare_hands(&a, &b), Ordering::Greater);
    }
}
