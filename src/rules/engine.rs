//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define their rules:
//! - What actions are legal
//! - How actions transform a session
//! - When the session is over

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::{Card, Color};
use crate::core::action::Action;
use crate::core::config::RulesConfig;
use crate::core::ids::CardId;
use crate::core::player::{PlayerId, Seat};
use crate::core::state::GameSession;

/// Result of a completed session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: PlayerId,
    pub round_points: u32,
}

/// Something that happened while applying an action.
///
/// Presentation layers use these as animation hints; coordinators log them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Drew { seat: Seat, card: CardId, playable: bool },
    Played { seat: Seat, card: Card, active_color: Color },
    Skipped { seat: Seat },
    Reversed { direction: i8 },
    ForcedDraw { seat: Seat, count: usize },
    Penalized { seat: Seat, count: usize },
    Declared { seat: Seat },
    Passed { seat: Seat },
    Restocked { cards: usize },
    TurnChanged { seat: Seat },
    Won { seat: Seat, round_points: u32 },
}

/// A successful state transition.
#[derive(Clone, Debug)]
pub struct Transition {
    pub session: GameSession,
    pub events: Vec<GameEvent>,
}

/// Why the engine refused an action. No state changes on any of these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("game is not active")]
    GameOver,
    #[error("not your turn")]
    NotYourTurn,
    #[error("card {0} is not in hand")]
    CardNotInHand(CardId),
    #[error("card {0} is not playable")]
    CardNotPlayable(CardId),
    #[error("wild draw four is only legal without a card of the active color")]
    WildDrawFourHasColorMatch,
    #[error("wild cards need a declared color")]
    MissingColorDeclaration,
    #[error("already drew this turn")]
    AlreadyDrew,
    #[error("must draw before passing")]
    MustDrawFirst,
    #[error("no cards left to draw")]
    NoCardsLeft,
    #[error("no last-card declaration is pending for this player")]
    NoPendingDeclaration,
    #[error("last-card declaration window has elapsed")]
    DeclarationExpired,
    #[error("{count} players is outside the allowed {min}-{max}")]
    InvalidPlayerCount { count: usize, min: usize, max: usize },
    #[error("player {0} is seated twice")]
    DuplicatePlayer(PlayerId),
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `apply` takes the session by reference and returns a new one; a
///   failed action must leave no trace
/// - `apply` must be deterministic given the session (which carries its
///   own RNG state) and `now_ms`
/// - `is_terminal`: return `None` while the session continues
pub trait RulesEngine {
    /// Get the rules configuration.
    fn config(&self) -> &RulesConfig;

    /// Actions `seat` could legally take right now.
    fn legal_actions(&self, session: &GameSession, seat: Seat, now_ms: u64) -> Vec<Action>;

    /// Apply an action on behalf of `seat`.
    fn apply(
        &self,
        session: &GameSession,
        seat: Seat,
        action: &Action,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation>;

    /// Check if the session is over.
    fn is_terminal(&self, session: &GameSession) -> Option<GameResult>;
}
