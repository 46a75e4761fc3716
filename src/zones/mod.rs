//! Card piles.
//!
//! Sessions have two shared piles: the draw pile (face down, pop = draw)
//! and the discard pile (top = current face-up card). Hands live on the
//! players.

pub mod pile;

pub use pile::{Pile, ZonePosition};
