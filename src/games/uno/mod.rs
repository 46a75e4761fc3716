//! Uno.
//!
//! - 108-card deck, 7-card hands, 2-10 players
//! - Match the discard by color or face; wilds always match
//! - Skip, reverse and draw cards move the turn; wild draw four is only
//!   legal without a card of the active color
//! - A player down to one card must declare it within a window or draw
//!   a penalty the next time anyone acts
//! - First empty hand wins the opponents' remaining points

mod game;
mod table;

pub use game::{UnoGameBuilder, UnoRules};
