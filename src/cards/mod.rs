//! Card system: the card model and the standard deck.
//!
//! ## Key Types
//!
//! - `Card`: immutable card with id, optional color, and face
//! - `Color`: the four real colors (wild cards carry none)
//! - `Face`: number 0-9, skip, reverse, draw-two, wild, wild-draw-four
//! - `Category`: number, action, wild (derived from the face)

pub mod card;
pub mod deck;

pub use card::{Card, Category, Color, Face};
pub use deck::{shuffled_deck, standard_deck, STANDARD_DECK_SIZE};
