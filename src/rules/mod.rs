//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define:
//! - Legal actions for each session state
//! - How actions transform the session
//! - When the session is over
//!
//! Coordinators call into `RulesEngine` but never interpret card rules
//! directly.

pub mod engine;

pub use engine::{GameEvent, GameResult, RuleViolation, RulesEngine, Transition};
