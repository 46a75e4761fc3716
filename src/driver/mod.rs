//! Automated players.
//!
//! - `MovePolicy`: picks an action for a seat
//! - `AutoPlayer`: submits those actions through a `Coordinator`

pub mod auto;
pub mod policy;

pub use auto::AutoPlayer;
pub use policy::{BaselinePolicy, MovePolicy, RandomPolicy};
