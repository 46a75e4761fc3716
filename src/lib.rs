//! # uno-sync
//!
//! A host-authoritative Uno engine with versioned state replication.
//!
//! ## Design Principles
//!
//! 1. **One Writer**: Exactly one participant (the host) applies actions and
//!    owns the version counter. Everyone else submits intents.
//!
//! 2. **All-or-Nothing Transitions**: The rules engine never mutates its
//!    input. Each operation returns a new session or a `RuleViolation`.
//!
//! 3. **Stale Means Rejected**: An intent formed against an older version is
//!    refused, not rebased. Duplicates and late deliveries cannot apply twice.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) session clones via `im-rs`, so
//!   every operation can work on a copy.
//!
//! - **Injected Randomness and Time**: Shuffles draw from a serialized
//!   `GameRng` carried in the session; the engine takes `now_ms` instead of
//!   reading a clock.
//!
//! - **Compare-and-Swap Records**: The replicated record is a single
//!   document written only if it still holds the expected version.
//!
//! ## Modules
//!
//! - `core`: ids, seats and players, session state, actions, RNG, clock, configuration
//! - `cards`: card model and the standard deck
//! - `zones`: ordered piles
//! - `rules`: `RulesEngine` trait, events, violations
//! - `games`: the Uno rules
//! - `session`: per-process session store and wire snapshots
//! - `sync`: intents, record stores, transports, host and peer coordinators
//! - `lobby`: rooms, invite codes, local rosters
//! - `driver`: automated players
//! - `telemetry`: tracing setup

pub mod cards;
pub mod core;
pub mod driver;
pub mod games;
pub mod lobby;
pub mod rules;
pub mod session;
pub mod sync;
pub mod telemetry;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    Action, CardId, Clock, GameMode, GameRng, GameRngState, GameSession, ManualClock,
    MoveKind, MoveRecord, PassReason, Player, PlayerId, PlayerSeed, RulesConfig, Seat,
    SessionId, SessionStatus, SyncConfig, SystemClock,
};

pub use crate::cards::{Card, Category, Color, Face};

pub use crate::zones::{Pile, ZonePosition};

pub use crate::rules::{GameEvent, GameResult, RuleViolation, RulesEngine, Transition};

pub use crate::games::uno::{UnoGameBuilder, UnoRules};

pub use crate::session::{SessionEvent, SessionStore, TurnNotice};

pub use crate::sync::{
    Coordinator, HostCoordinator, MemoryHub, MemoryRecordStore, PeerCoordinator, RecordStore,
    RejectReason, Rejection, SubmitError, SyncPhase, Transport,
};

pub use crate::lobby::{LobbyError, Room, RoomCode};

pub use crate::driver::{AutoPlayer, BaselinePolicy, MovePolicy};
