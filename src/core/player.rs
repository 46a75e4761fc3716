//! Seats, player identities, and per-player state.
//!
//! ## Seat
//!
//! Type-safe 0-based index into the session's fixed player list. Seat order
//! defines turn order.
//!
//! ## PlayerId
//!
//! Opaque participant identity (`p_1`, `p_2`, ...). Intents name their actor
//! by `PlayerId`; the host resolves it to a `Seat`.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::core::ids::CardId;

/// Seat index supporting up to 255 players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seat(pub u8);

impl Seat {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all seats for a game with `player_count` players.
    ///
    /// ```
    /// use uno_sync::core::Seat;
    ///
    /// let seats: Vec<_> = Seat::all(3).collect();
    /// assert_eq!(seats, vec![Seat(0), Seat(1), Seat(2)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = Seat> {
        (0..player_count as u8).map(Seat)
    }

    /// Seat reached after `steps` single moves in `direction` (+1 or -1).
    ///
    /// Euclidean modulo, so negative offsets wrap correctly.
    ///
    /// ```
    /// use uno_sync::core::Seat;
    ///
    /// assert_eq!(Seat(0).step(1, -1, 4), Seat(3));
    /// assert_eq!(Seat(3).step(2, 1, 4), Seat(1));
    /// ```
    #[must_use]
    pub fn step(self, steps: usize, direction: i8, player_count: usize) -> Seat {
        let n = player_count as i64;
        let next = (self.0 as i64 + steps as i64 * direction as i64).rem_euclid(n);
        Seat(next as u8)
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Participant identity within a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Conventional id for the player at a seat (`p_1` for seat 0).
    #[must_use]
    pub fn for_seat(seat: Seat) -> Self {
        Self(format!("p_{}", seat.0 as u32 + 1))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to seat a player when a session is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    pub name: String,
    /// External account id for online play.
    pub user_id: Option<String>,
    pub is_automated: bool,
}

impl PlayerSeed {
    #[must_use]
    pub fn human(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.into(),
            user_id: None,
            is_automated: false,
        }
    }

    #[must_use]
    pub fn automated(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_automated: true,
            ..Self::human(id, name)
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A seated player and their hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Stable order for rendering; order is irrelevant to legality.
    pub hand: Vector<Card>,
    pub is_automated: bool,
    /// True while a last-card declaration is owed by this player.
    #[serde(default)]
    pub must_declare_last_card: bool,
}

impl Player {
    #[must_use]
    pub fn from_seed(seed: PlayerSeed) -> Self {
        Self {
            id: seed.id,
            name: seed.name,
            user_id: seed.user_id,
            hand: Vector::new(),
            is_automated: seed.is_automated,
            must_declare_last_card: false,
        }
    }

    /// Derived: exactly one card left.
    #[must_use]
    pub fn one_card_warning(&self) -> bool {
        self.hand.len() == 1
    }

    #[must_use]
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.hand.iter().find(|c| c.id == id)
    }

    /// Remove a card from the hand, returning it.
    pub fn take_card(&mut self, id: CardId) -> Option<Card> {
        let pos = self.hand.iter().position(|c| c.id == id)?;
        Some(self.hand.remove(pos))
    }

    /// Sum of point values left in hand.
    #[must_use]
    pub fn hand_points(&self) -> u32 {
        self.hand.iter().map(Card::points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Color, Face};

    #[test]
    fn test_seat_step_wraps_both_ways() {
        assert_eq!(Seat(0).step(1, 1, 3), Seat(1));
        assert_eq!(Seat(2).step(1, 1, 3), Seat(0));
        assert_eq!(Seat(0).step(1, -1, 3), Seat(2));
        assert_eq!(Seat(0).step(2, -1, 3), Seat(1));
        assert_eq!(Seat(1).step(2, 1, 2), Seat(1));
        assert_eq!(Seat(0).step(0, -1, 5), Seat(0));
    }

    #[test]
    fn test_player_id_for_seat() {
        assert_eq!(PlayerId::for_seat(Seat(0)).as_str(), "p_1");
        assert_eq!(PlayerId::for_seat(Seat(3)).as_str(), "p_4");
    }

    #[test]
    fn test_player_hand_helpers() {
        let mut player = Player::from_seed(PlayerSeed::human("p_1", "Ada"));
        player.hand.push_back(Card::number(CardId(1), Color::Red, 5));
        player.hand.push_back(Card::wild(CardId(2), Face::Wild));

        assert_eq!(player.hand_points(), 55);
        assert!(!player.one_card_warning());

        let taken = player.take_card(CardId(2));
        assert_eq!(taken.map(|c| c.face), Some(Face::Wild));
        assert!(player.one_card_warning());
        assert!(player.take_card(CardId(99)).is_none());
    }

    #[test]
    fn test_seed_builders() {
        let seed = PlayerSeed::automated("p_2", "LILY").with_user_id("u-9");
        assert!(seed.is_automated);
        assert_eq!(seed.user_id.as_deref(), Some("u-9"));
    }
}
