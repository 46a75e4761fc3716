//! Ordered card piles (draw pile, discard pile).
//!
//! A `Pile` is a stack: the top is the end of the underlying vector.
//! Backed by `im::Vector` so cloning a whole session is O(1), which is what
//! makes all-or-nothing rule transitions cheap.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::core::ids::CardId;
use crate::core::rng::GameRng;

/// Position for inserting a card into a pile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of pile.
    Top,
    /// Add to bottom of pile.
    Bottom,
}

/// An ordered stack of cards.
///
/// ```
/// use uno_sync::cards::{Card, Color};
/// use uno_sync::core::CardId;
/// use uno_sync::zones::{Pile, ZonePosition};
///
/// let mut pile = Pile::new();
/// pile.put(Card::number(CardId(1), Color::Red, 3), ZonePosition::Top);
/// pile.put(Card::number(CardId(2), Color::Blue, 4), ZonePosition::Bottom);
///
/// assert_eq!(pile.top().map(|c| c.id), Some(CardId(1)));
/// assert_eq!(pile.pop().map(|c| c.id), Some(CardId(1)));
/// assert_eq!(pile.pop().map(|c| c.id), Some(CardId(2)));
/// assert!(pile.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pile {
    cards: Vector<Card>,
}

impl Pile {
    /// Create an empty pile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pile from cards listed bottom to top.
    #[must_use]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The face-up (top) card.
    #[must_use]
    pub fn top(&self) -> Option<&Card> {
        self.cards.back()
    }

    /// Remove and return the top card.
    pub fn pop(&mut self) -> Option<Card> {
        self.cards.pop_back()
    }

    /// Insert a card at the given end.
    pub fn put(&mut self, card: Card, position: ZonePosition) {
        match position {
            ZonePosition::Top => self.cards.push_back(card),
            ZonePosition::Bottom => self.cards.push_front(card),
        }
    }

    /// Push onto the top.
    pub fn push(&mut self, card: Card) {
        self.put(card, ZonePosition::Top);
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.iter().any(|c| c.id == id)
    }

    /// Iterate bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Shuffle the pile in place.
    pub fn shuffle(&mut self, rng: &mut GameRng) {
        let mut cards: Vec<Card> = self.cards.iter().copied().collect();
        rng.shuffle(&mut cards);
        self.cards = cards.into_iter().collect();
    }

    /// Remove everything except the top card and return the removed cards
    /// (bottom to top). Used to restock an empty draw pile from the discards.
    pub fn take_all_but_top(&mut self) -> Vec<Card> {
        let Some(top) = self.cards.pop_back() else {
            return Vec::new();
        };
        let rest: Vec<Card> = self.cards.iter().copied().collect();
        self.cards = Vector::unit(top);
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Color;

    fn card(id: u32) -> Card {
        Card::number(CardId(id), Color::Red, (id % 10) as u8)
    }

    #[test]
    fn test_push_pop_order() {
        let mut pile = Pile::new();
        pile.push(card(1));
        pile.push(card(2));
        pile.push(card(3));

        assert_eq!(pile.len(), 3);
        assert_eq!(pile.top().map(|c| c.id), Some(CardId(3)));
        assert_eq!(pile.pop().map(|c| c.id), Some(CardId(3)));
        assert_eq!(pile.pop().map(|c| c.id), Some(CardId(2)));
    }

    #[test]
    fn test_bottom_insert() {
        let mut pile = Pile::from_cards([card(1), card(2)]);
        pile.put(card(3), ZonePosition::Bottom);

        let order: Vec<_> = pile.iter().map(|c| c.id.raw()).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_take_all_but_top() {
        let mut pile = Pile::from_cards([card(1), card(2), card(3)]);
        let rest = pile.take_all_but_top();

        assert_eq!(rest.iter().map(|c| c.id.raw()).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pile.len(), 1);
        assert_eq!(pile.top().map(|c| c.id), Some(CardId(3)));
    }

    #[test]
    fn test_take_all_but_top_on_small_piles() {
        let mut empty = Pile::new();
        assert!(empty.take_all_but_top().is_empty());

        let mut single = Pile::from_cards([card(1)]);
        assert!(single.take_all_but_top().is_empty());
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_shuffle_keeps_cards() {
        let mut pile = Pile::from_cards((1..=20).map(card));
        pile.shuffle(&mut GameRng::new(3));

        assert_eq!(pile.len(), 20);
        for id in 1..=20 {
            assert!(pile.contains(CardId(id)));
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Pile::from_cards([card(1), card(2)]);
        let mut copy = original.clone();
        copy.pop();

        assert_eq!(original.len(), 2);
        assert_eq!(copy.len(), 1);
    }
}
