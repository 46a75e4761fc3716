//! Core types: ids, seats and players, state, actions, RNG, clock,
//! configuration.
//!
//! Everything here is plain data plus small helpers; the rules live in
//! `rules` and `games`.

pub mod action;
pub mod clock;
pub mod config;
pub mod ids;
pub mod player;
pub mod rng;
pub mod state;

pub use action::{Action, MoveKind, MoveRecord, PassReason};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, DriverConfig, RulesConfig, SyncConfig};
pub use ids::{CardId, IdSource, SequentialIds, SessionId};
pub use player::{Player, PlayerId, PlayerSeed, Seat};
pub use rng::{GameRng, GameRngState};
pub use state::{
    CardAuditError, GameMode, GameSession, PendingDeclaration, SessionStatus, TurnState,
};
