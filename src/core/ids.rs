//! Card and session identifiers.
//!
//! Card ids come from an injectable [`IdSource`] rather than a global
//! counter, so two engines in one process (or one test after another) never
//! share id state.
//!
//! ```
//! use uno_sync::core::{CardId, IdSource, SequentialIds};
//!
//! let mut ids = SequentialIds::new();
//! assert_eq!(ids.next_card_id(), CardId(1));
//! assert_eq!(ids.next_card_id(), CardId(2));
//! assert_eq!(CardId(7).to_string(), "card_7");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier of a card within one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for CardId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "card_{}", self.0)
    }
}

/// Source of fresh card identifiers.
pub trait IdSource {
    /// Allocate the next card id. Ids are never reused by one source.
    fn next_card_id(&mut self) -> CardId;
}

/// Monotonic id source starting at 1.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    next: u32,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    #[must_use]
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_card_id(&mut self) -> CardId {
        let id = CardId(self.next);
        self.next += 1;
        id
    }
}

/// Identifier of a game session (and of its replicated record).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new();
        let first: Vec<_> = (0..3).map(|_| ids.next_card_id()).collect();
        assert_eq!(first, vec![CardId(1), CardId(2), CardId(3)]);
    }

    #[test]
    fn test_independent_sources() {
        let mut a = SequentialIds::new();
        let mut b = SequentialIds::new();
        a.next_card_id();
        a.next_card_id();
        assert_eq!(b.next_card_id(), CardId(1));
    }

    #[test]
    fn test_starting_at() {
        let mut ids = SequentialIds::starting_at(500);
        assert_eq!(ids.next_card_id(), CardId(500));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CardId(42)), "card_42");
        assert_eq!(SessionId::new("room-1").to_string(), "room-1");
    }

    #[test]
    fn test_serialization() {
        let id = CardId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: CardId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
