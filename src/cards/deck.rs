//! Standard 108-card deck construction.

use crate::core::ids::IdSource;
use crate::core::rng::GameRng;

use super::card::{Card, Color, Face};

/// Number of cards in a standard deck.
pub const STANDARD_DECK_SIZE: usize = 108;

/// Build an unshuffled standard deck.
///
/// Per color: one 0, two each of 1-9, two each of skip, reverse and
/// draw-two. Plus four wild and four wild-draw-four.
pub fn standard_deck(ids: &mut impl IdSource) -> Vec<Card> {
    let mut deck = Vec::with_capacity(STANDARD_DECK_SIZE);

    for color in Color::ALL {
        deck.push(Card::number(ids.next_card_id(), color, 0));
        for n in 1..=9 {
            deck.push(Card::number(ids.next_card_id(), color, n));
            deck.push(Card::number(ids.next_card_id(), color, n));
        }
        for face in [Face::Skip, Face::Reverse, Face::DrawTwo] {
            deck.push(Card::action(ids.next_card_id(), color, face));
            deck.push(Card::action(ids.next_card_id(), color, face));
        }
    }

    for _ in 0..4 {
        deck.push(Card::wild(ids.next_card_id(), Face::Wild));
        deck.push(Card::wild(ids.next_card_id(), Face::WildDrawFour));
    }

    deck
}

/// Build a standard deck and shuffle it.
pub fn shuffled_deck(ids: &mut impl IdSource, rng: &mut GameRng) -> Vec<Card> {
    let mut deck = standard_deck(ids);
    rng.shuffle(&mut deck);
    deck
}
