//! Local (same-device) player list.

use rustc_hash::FxHashSet;

use super::room::MAX_PLAYERS;
use super::LobbyError;
use crate::core::player::{PlayerId, PlayerSeed, Seat};

/// Names offered to the automated opponent, in order of preference.
pub const AUTOMATED_NAMES: [&str; 5] = ["LILY", "LIA", "MILO", "ZOE", "MAX"];
const FALLBACK_NAME: &str = "CPU";

/// Trim and collapse internal whitespace.
///
/// ```
/// use uno_sync::lobby::normalize_name;
///
/// assert_eq!(normalize_name("  Ada   Lovelace "), "Ada Lovelace");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate local names and seat them as `p_1..p_n`.
///
/// A lone human gets an automated opponent.
pub fn local_roster<S: AsRef<str>>(names: &[S]) -> Result<Vec<PlayerSeed>, LobbyError> {
    if names.is_empty() || names.len() > MAX_PLAYERS {
        return Err(LobbyError::InvalidExpectedPlayers(names.len()));
    }

    let normalized: Vec<String> = names.iter().map(|n| normalize_name(n.as_ref())).collect();
    if normalized.iter().any(String::is_empty) {
        return Err(LobbyError::MissingNames);
    }

    let taken: FxHashSet<String> = normalized.iter().map(|n| n.to_lowercase()).collect();
    if taken.len() != normalized.len() {
        return Err(LobbyError::DuplicateNames);
    }

    let mut seeds: Vec<PlayerSeed> = normalized
        .into_iter()
        .enumerate()
        .map(|(i, name)| PlayerSeed::human(PlayerId::for_seat(Seat(i as u8)).0, name))
        .collect();

    if seeds.len() == 1 {
        seeds.push(PlayerSeed::automated("p_ai_1", automated_name(&taken)));
    }
    Ok(seeds)
}

/// First automated name not already taken (compared lower-case).
fn automated_name(taken: &FxHashSet<String>) -> &'static str {
    AUTOMATED_NAMES
        .iter()
        .find(|n| !taken.contains(&n.to_lowercase()))
        .copied()
        .unwrap_or(FALLBACK_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_validation() {
        assert_eq!(local_roster(&["Ada", " "]), Err(LobbyError::MissingNames));
        assert_eq!(local_roster(&["Ada", "ADA "]), Err(LobbyError::DuplicateNames));
        assert_eq!(
            local_roster::<&str>(&[]),
            Err(LobbyError::InvalidExpectedPlayers(0))
        );
    }

    #[test]
    fn test_roster_ids() {
        let seeds = local_roster(&["dad", "  lily  ", "Lia"]).unwrap();
        let names: Vec<_> = seeds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["dad", "lily", "Lia"]);
        assert_eq!(seeds[2].id.as_str(), "p_3");
        assert!(seeds.iter().all(|s| !s.is_automated));
    }

    #[test]
    fn test_single_human_gets_opponent() {
        let seeds = local_roster(&["Ada"]).unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds[1].is_automated);
        assert_eq!(seeds[1].name, "LILY");

        let seeds = local_roster(&["lily"]).unwrap();
        assert_eq!(seeds[1].name, "LIA");
    }

    #[test]
    fn test_opponent_fallback_name() {
        let taken: FxHashSet<String> = AUTOMATED_NAMES.iter().map(|n| n.to_lowercase()).collect();
        assert_eq!(automated_name(&taken), "CPU");
    }
}
