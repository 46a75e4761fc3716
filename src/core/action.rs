//! Actions a participant can request, and the move history they leave.
//!
//! `Action` is the payload of an intent. It is deliberately small and
//! externally tagged so it survives both JSON and bincode.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::ids::CardId;
use super::player::Seat;
use crate::cards::Color;

/// Why a player ended their turn without playing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassReason {
    /// Chose to keep the drawn card.
    Voluntary,
    /// Drew and could not play.
    NothingPlayable,
    /// Ran out of time.
    TimedOut,
}

/// A requested state mutation.
///
/// ```
/// use uno_sync::cards::Color;
/// use uno_sync::core::{Action, CardId};
///
/// let play = Action::Play { card: CardId(12), declared_color: Some(Color::Blue) };
/// assert_eq!(play.kind(), "play");
/// assert_eq!(Action::Draw.kind(), "draw");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Draw,
    Play {
        card: CardId,
        /// Required for wild-family cards, ignored otherwise.
        declared_color: Option<Color>,
    },
    Pass {
        reason: PassReason,
    },
    DeclareLastCard,
}

impl Action {
    /// Short action type name for logs and rejections.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Action::Draw => "draw",
            Action::Play { .. } => "play",
            Action::Pass { .. } => "pass",
            Action::DeclareLastCard => "declare_last_card",
        }
    }

    /// Whether the action must first settle an outstanding declaration.
    #[must_use]
    pub const fn settles_declaration(&self) -> bool {
        !matches!(self, Action::DeclareLastCard)
    }
}

/// What a history entry records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// Starter card flipped at session creation.
    Starter { label: String },
    Draw,
    Play { label: String },
    Pass { reason: PassReason },
    DeclareLastCard,
    /// Cards forced onto the next player by a draw card.
    ForcedDraw,
    /// Cards drawn for a missed last-card declaration.
    Penalty,
    /// Discard pile reshuffled into a new draw pile.
    Restock,
}

/// A history entry, for audit and animation hints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub seat: Seat,
    pub kind: MoveKind,
    /// Cards involved (at most 4 except for restocks).
    pub cards: SmallVec<[CardId; 4]>,
    pub at_ms: u64,
}

impl MoveRecord {
    #[must_use]
    pub fn new(seat: Seat, kind: MoveKind, cards: &[CardId], at_ms: u64) -> Self {
        Self {
            seat,
            kind,
            cards: SmallVec::from_slice(cards),
            at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Action::Pass { reason: PassReason::Voluntary }.kind(), "pass");
        assert_eq!(Action::DeclareLastCard.kind(), "declare_last_card");
    }

    #[test]
    fn test_settles_declaration() {
        assert!(Action::Draw.settles_declaration());
        assert!(!Action::DeclareLastCard.settles_declaration());
    }

    #[test]
    fn test_action_bincode_roundtrip() {
        let action = Action::Play {
            card: CardId(77),
            declared_color: Some(Color::Green),
        };
        let bytes = bincode::serialize(&action).unwrap();
        let back: Action = bincode::deserialize(&bytes).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn test_move_record() {
        let record = MoveRecord::new(Seat(1), MoveKind::ForcedDraw, &[CardId(1), CardId(2)], 99);
        assert_eq!(record.cards.len(), 2);
        assert!(!record.cards.spilled());

        let json = serde_json::to_string(&record).unwrap();
        let back: MoveRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
