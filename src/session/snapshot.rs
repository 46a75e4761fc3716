//! Wire boundary for the session state.
//!
//! The replicated record carries the session as a JSON document. Export is a
//! plain serialization; import re-validates what arrived so a corrupt or
//! tampered record is refused instead of adopted.

use serde_json::Value;
use thiserror::Error;

use crate::core::state::{CardAuditError, GameSession};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("session could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("session could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("card audit failed: {0}")]
    Audit(#[from] CardAuditError),
    #[error("turn {turn} is outside a {players}-player session")]
    TurnOutOfRange { turn: u8, players: usize },
    #[error("direction must be 1 or -1, got {0}")]
    Direction(i8),
}

/// Deep copy of the session into its wire form.
pub fn export(session: &GameSession) -> Result<Value, SnapshotError> {
    serde_json::to_value(session).map_err(SnapshotError::Encode)
}

/// Rebuild a session from its wire form.
pub fn import(value: Value) -> Result<GameSession, SnapshotError> {
    let session: GameSession = serde_json::from_value(value).map_err(SnapshotError::Decode)?;
    validate(&session)?;
    Ok(session)
}

/// Structural checks that hold for every valid session.
pub fn validate(session: &GameSession) -> Result<(), SnapshotError> {
    if session.current_turn.index() >= session.player_count() {
        return Err(SnapshotError::TurnOutOfRange {
            turn: session.current_turn.0,
            players: session.player_count(),
        });
    }
    if session.direction != 1 && session.direction != -1 {
        return Err(SnapshotError::Direction(session.direction));
    }
    session.audit_cards(session.deck_size)?;
    Ok(())
}
