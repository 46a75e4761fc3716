//! Online rooms: who joined, in which slot, and whether the host may start.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::invite::RoomCode;
use super::LobbyError;
use crate::core::ids::SessionId;
use crate::core::player::{PlayerId, PlayerSeed, Seat};
use crate::core::rng::GameRng;
use crate::core::state::SessionStatus;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub slot: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: SessionId,
    pub code: RoomCode,
    pub host_user_id: String,
    pub expected_players: usize,
    pub status: SessionStatus,
    members: Vec<Member>,
}

impl Room {
    /// Open a room with the host in slot 0.
    ///
    /// The code comes from a stream keyed on the room id, so `rng` is left
    /// untouched for dealing.
    pub fn open(
        id: SessionId,
        host_user_id: impl Into<String>,
        host_name: impl Into<String>,
        expected_players: usize,
        rng: &GameRng,
    ) -> Result<Self, LobbyError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&expected_players) {
            return Err(LobbyError::InvalidExpectedPlayers(expected_players));
        }
        let host_user_id = host_user_id.into();
        let code = RoomCode::generate(&mut rng.for_context(&format!("room-code/{id}")));
        let mut room = Self {
            id,
            code,
            host_user_id: host_user_id.clone(),
            expected_players,
            status: SessionStatus::Waiting,
            members: Vec::new(),
        };
        room.join(host_user_id, host_name)?;
        Ok(room)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.expected_players
    }

    /// Join, or rejoin, returning the member's slot.
    ///
    /// A returning member keeps their slot; a new member takes the lowest
    /// free one.
    pub fn join(
        &mut self,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<usize, LobbyError> {
        if self.status == SessionStatus::Finished {
            return Err(LobbyError::RoomFinished);
        }
        let user_id = user_id.into();
        if let Some(member) = self.members.iter().find(|m| m.user_id == user_id) {
            return Ok(member.slot);
        }
        if self.is_full() {
            return Err(LobbyError::RoomFull);
        }

        let slot = (0..)
            .find(|slot| self.members.iter().all(|m| m.slot != *slot))
            .unwrap_or(self.members.len());
        self.members.push(Member {
            user_id,
            name: name.into(),
            slot,
        });
        self.members.sort_by_key(|m| m.slot);
        debug!(room = %self.code, slot, "member joined");
        Ok(slot)
    }

    pub fn leave(&mut self, user_id: &str) {
        self.members.retain(|m| m.user_id != user_id);
    }

    /// Validate a start request and produce seats in slot order.
    pub fn seat_players(&self, requester: &str) -> Result<Vec<PlayerSeed>, LobbyError> {
        if requester != self.host_user_id {
            return Err(LobbyError::NotHost);
        }
        if self.status == SessionStatus::Finished {
            return Err(LobbyError::RoomFinished);
        }
        if self.members.len() < MIN_PLAYERS {
            return Err(LobbyError::NotEnoughPlayers);
        }
        if self.members.len() != self.expected_players {
            return Err(LobbyError::WaitingForPlayers {
                joined: self.members.len(),
                expected: self.expected_players,
            });
        }

        Ok(self
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let id = PlayerId::for_seat(Seat(i as u8));
                PlayerSeed::human(id.0, m.name.clone()).with_user_id(m.user_id.clone())
            })
            .collect())
    }

    pub fn mark_active(&mut self) {
        self.status = SessionStatus::Active;
    }

    pub fn mark_finished(&mut self) {
        self.status = SessionStatus::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(expected: usize) -> Room {
        Room::open(SessionId::new("room"), "u-host", "Host", expected, &GameRng::new(4)).unwrap()
    }

    #[test]
    fn test_code_stream_keyed_on_room() {
        let rng = GameRng::new(4);
        let before = rng.state();
        let a = Room::open(SessionId::new("a"), "u", "U", 2, &rng).unwrap();
        let again = Room::open(SessionId::new("a"), "u", "U", 2, &rng).unwrap();
        let b = Room::open(SessionId::new("b"), "u", "U", 2, &rng).unwrap();

        assert_eq!(a.code, again.code);
        assert_ne!(a.code, b.code);
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn test_open_validates_size() {
        let err = Room::open(SessionId::new("r"), "u", "U", 1, &GameRng::new(1)).unwrap_err();
        assert_eq!(err, LobbyError::InvalidExpectedPlayers(1));
        let err = Room::open(SessionId::new("r"), "u", "U", 11, &GameRng::new(1)).unwrap_err();
        assert_eq!(err, LobbyError::InvalidExpectedPlayers(11));
    }

    #[test]
    fn test_join_slots() {
        let mut room = room(3);
        assert_eq!(room.members()[0].slot, 0);
        assert_eq!(room.join("u-a", "A"), Ok(1));
        assert_eq!(room.join("u-a", "A again"), Ok(1));
        assert_eq!(room.join("u-b", "B"), Ok(2));
        assert_eq!(room.join("u-c", "C"), Err(LobbyError::RoomFull));

        room.leave("u-a");
        assert_eq!(room.join("u-c", "C"), Ok(1));
    }

    #[test]
    fn test_join_finished() {
        let mut room = room(2);
        room.mark_finished();
        assert_eq!(room.join("u-a", "A"), Err(LobbyError::RoomFinished));
    }

    #[test]
    fn test_start_rules() {
        let mut room = room(3);
        assert_eq!(room.seat_players("u-host"), Err(LobbyError::NotEnoughPlayers));
        room.join("u-a", "A").unwrap();
        assert_eq!(room.seat_players("u-a"), Err(LobbyError::NotHost));
        assert_eq!(
            room.seat_players("u-host"),
            Err(LobbyError::WaitingForPlayers {
                joined: 2,
                expected: 3
            })
        );

        room.join("u-b", "B").unwrap();
        let seeds = room.seat_players("u-host").unwrap();
        let ids: Vec<_> = seeds.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["p_1", "p_2", "p_3"]);
        assert_eq!(seeds[1].user_id.as_deref(), Some("u-a"));
        assert!(seeds.iter().all(|s| !s.is_automated));
    }
}
