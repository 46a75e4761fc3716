//! Game session state.
//!
//! `GameSession` is the single value the host mutates and replicates. It
//! holds every card (hands + draw pile + discard pile), turn bookkeeping,
//! the pending last-card declaration, the move history, the serialized RNG
//! and the replication `version`.
//!
//! Uses `im` persistent data structures so cloning is O(1); the rules
//! engine clones, mutates the clone, and only returns it on success.

use im::Vector;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::action::{MoveKind, MoveRecord};
use super::ids::{CardId, SessionId};
use super::player::{Player, PlayerId, Seat};
use super::rng::GameRngState;
use crate::cards::{Card, Color};
use crate::zones::Pile;

/// How the session is being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Everyone on one process.
    Local,
    /// Participants on separate processes, synchronized through the record.
    Online,
}

/// Lifecycle status, mirrored on the replicated record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

/// Per-turn bookkeeping, reset whenever the turn moves to another seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub has_drawn: bool,
    pub drawn_card: Option<CardId>,
    pub drawn_playable: bool,
}

/// An armed last-card obligation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDeclaration {
    pub seat: Seat,
    pub deadline_ms: u64,
}

impl PendingDeclaration {
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.deadline_ms
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardAuditError {
    #[error("{0} appears more than once")]
    Duplicate(CardId),
    #[error("expected {expected} cards in play, found {actual}")]
    Count { expected: usize, actual: usize },
}

/// Complete authoritative game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: SessionId,
    pub mode: GameMode,

    /// Fixed at creation; order defines turn sequence.
    pub players: Vector<Player>,

    /// Face down, pop = draw.
    pub draw_pile: Pile,

    /// Top = current face-up card.
    pub discard_pile: Pile,

    /// Cards dealt into the session. Hands and piles always hold exactly
    /// this many.
    pub deck_size: usize,

    pub current_turn: Seat,

    /// +1 or -1.
    pub direction: i8,

    /// Color plays must match. Never wild.
    pub active_color: Color,

    pub winner: Option<PlayerId>,

    /// Opponents' remaining hand value, set when the session finishes.
    pub round_points: Option<u32>,

    /// Append-only.
    pub history: Vector<MoveRecord>,

    pub turn_state: TurnState,

    pub pending_declaration: Option<PendingDeclaration>,

    /// Incremented once per accepted mutation by the host.
    pub version: u64,

    pub status: SessionStatus,

    /// RNG position for reshuffles during play.
    pub rng: GameRngState,

    pub started_at_ms: u64,
}

impl GameSession {
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn seats(&self) -> impl Iterator<Item = Seat> {
        Seat::all(self.players.len())
    }

    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    pub fn player_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.players.get_mut(seat.index())
    }

    /// Resolve an identity to its seat.
    #[must_use]
    pub fn seat_of(&self, id: &PlayerId) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| &p.id == id)
            .map(|i| Seat(i as u8))
    }

    /// Player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.player(self.current_turn)
    }

    #[must_use]
    pub fn top_card(&self) -> Option<&Card> {
        self.discard_pile.top()
    }

    /// Seat reached after `steps` moves in the current direction.
    #[must_use]
    pub fn seat_after(&self, steps: usize) -> Seat {
        self.current_turn
            .step(steps, self.direction, self.player_count())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// Append a history entry.
    pub fn record(&mut self, seat: Seat, kind: MoveKind, cards: &[CardId], at_ms: u64) {
        self.history
            .push_back(MoveRecord::new(seat, kind, cards, at_ms));
    }

    /// Cards across hands, draw pile and discard pile.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.players.iter().map(Player::hand_size).sum::<usize>()
            + self.draw_pile.len()
            + self.discard_pile.len()
    }

    /// Verify every card exists exactly once and nothing was lost.
    pub fn audit_cards(&self, expected: usize) -> Result<(), CardAuditError> {
        let mut seen = FxHashSet::default();
        let all = self
            .players
            .iter()
            .flat_map(|p| p.hand.iter())
            .chain(self.draw_pile.iter())
            .chain(self.discard_pile.iter());

        for card in all {
            if !seen.insert(card.id) {
                return Err(CardAuditError::Duplicate(card.id));
            }
        }

        if seen.len() != expected {
            return Err(CardAuditError::Count {
                expected,
                actual: seen.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::player::PlayerSeed;
    use crate::core::rng::GameRng;

    fn session_with(hands: &[&[u32]], draw: &[u32], discard: &[u32]) -> GameSession {
        let card = |id: &u32| Card::number(CardId(*id), Color::Red, (*id % 10) as u8);
        let players = hands
            .iter()
            .enumerate()
            .map(|(i, hand)| {
                let mut p = Player::from_seed(PlayerSeed::human(format!("p_{}", i + 1), "x"));
                p.hand = hand.iter().map(card).collect();
                p
            })
            .collect();

        GameSession {
            id: SessionId::new("s"),
            mode: GameMode::Local,
            players,
            draw_pile: Pile::from_cards(draw.iter().map(card)),
            discard_pile: Pile::from_cards(discard.iter().map(card)),
            deck_size: hands.iter().map(|h| h.len()).sum::<usize>() + draw.len() + discard.len(),
            current_turn: Seat(0),
            direction: 1,
            active_color: Color::Red,
            winner: None,
            round_points: None,
            history: Vector::new(),
            turn_state: TurnState::default(),
            pending_declaration: None,
            version: 0,
            status: SessionStatus::Active,
            rng: GameRng::new(1).state(),
            started_at_ms: 0,
        }
    }

    #[test]
    fn test_seat_lookup() {
        let session = session_with(&[&[1], &[2], &[3]], &[], &[4]);
        assert_eq!(session.seat_of(&PlayerId::new("p_2")), Some(Seat(1)));
        assert_eq!(session.seat_of(&PlayerId::new("p_9")), None);
        assert_eq!(session.current_player().map(|p| p.id.as_str()), Some("p_1"));
    }

    #[test]
    fn test_seat_after_respects_direction() {
        let mut session = session_with(&[&[1], &[2], &[3], &[4]], &[], &[5]);
        assert_eq!(session.seat_after(1), Seat(1));
        session.direction = -1;
        assert_eq!(session.seat_after(1), Seat(3));
        assert_eq!(session.seat_after(2), Seat(2));
    }

    #[test]
    fn test_audit_ok() {
        let session = session_with(&[&[1, 2], &[3]], &[4, 5], &[6]);
        assert_eq!(session.total_cards(), 6);
        assert_eq!(session.audit_cards(6), Ok(()));
    }

    #[test]
    fn test_audit_detects_duplicate_and_loss() {
        let dup = session_with(&[&[1, 2], &[2]], &[4], &[6]);
        assert_eq!(dup.audit_cards(5), Err(CardAuditError::Duplicate(CardId(2))));

        let lost = session_with(&[&[1], &[2]], &[], &[3]);
        assert_eq!(
            lost.audit_cards(4),
            Err(CardAuditError::Count { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_clone_shares_until_mutated() {
        let session = session_with(&[&[1, 2], &[3]], &[4], &[5]);
        let mut next = session.clone();
        next.player_mut(Seat(0)).unwrap().hand.pop_back();

        assert_eq!(session.player(Seat(0)).unwrap().hand_size(), 2);
        assert_eq!(next.player(Seat(0)).unwrap().hand_size(), 1);
    }

    #[test]
    fn test_serde_roundtrip() {
        let session = session_with(&[&[1], &[2]], &[3], &[4]);
        let json = serde_json::to_string(&session).unwrap();
        let back: GameSession = serde_json::from_str(&json).unwrap();
        assert_eq!(session, back);
    }
}
