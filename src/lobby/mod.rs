//! Getting players into a session.
//!
//! - `Room`: online lobby with slots, host-only start
//! - `RoomCode`: short codes and their invite tokens
//! - `local_roster`: name validation for same-device play

use thiserror::Error;

pub mod invite;
pub mod roster;
pub mod room;

pub use invite::RoomCode;
pub use room::{Member, Room};
pub use roster::{local_roster, normalize_name};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("room has already finished")]
    RoomFinished,
    #[error("room is full")]
    RoomFull,
    #[error("only the host can start the match")]
    NotHost,
    #[error("need at least 2 players in the room")]
    NotEnoughPlayers,
    #[error("waiting for all players ({joined}/{expected})")]
    WaitingForPlayers { joined: usize, expected: usize },
    #[error("please enter all player names")]
    MissingNames,
    #[error("player names must be unique")]
    DuplicateNames,
    #[error("{0} players is not a valid table size")]
    InvalidExpectedPlayers(usize),
}
