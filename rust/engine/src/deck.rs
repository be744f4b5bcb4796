use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::cards::{full_deck, Card};

/// A fixed 52-card array dealt linearly through a cursor.
///
/// The deck owns its RNG so every hand of a match is reproducible from the
/// match seed. Cards are never re-shuffled mid-hand: [`Deck::shuffle`] is only
/// called between hands.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: [Card; 52],
    position: usize,
    rng: ChaCha20Rng,
}

impl Deck {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            cards: full_deck(),
            position: 0,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Restore the full deck and shuffle it with the deck's own RNG stream.
    pub fn shuffle(&mut self) {
        self.cards = full_deck();
        self.cards.shuffle(&mut self.rng);
        self.position = 0;
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.position).copied()?;
        self.position += 1;
        Some(card)
    }

    pub fn burn_card(&mut self) {
        let _ = self.deal_card();
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.position
    }

    /// Cards not yet dealt, in dealing order.
    pub fn undealt(&self) -> &[Card] {
        &self.cards[self.position..]
    }
}
