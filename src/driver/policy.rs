//! Move choice for automated players.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;

use crate::cards::Color;
use crate::core::action::{Action, PassReason};
use crate::core::player::Seat;
use crate::core::rng::GameRng;
use crate::core::state::GameSession;
use crate::rules::RulesEngine;

// =============================================================================
// Move Policy
// =============================================================================

/// Chooses what an automated seat does next.
pub trait MovePolicy<E: RulesEngine>: Send + Sync {
    /// Choose an action for `seat`.
    ///
    /// Returns `None` if the seat has nothing to do right now.
    fn choose_action(
        &self,
        engine: &E,
        session: &GameSession,
        seat: Seat,
        now_ms: u64,
        rng: &mut GameRng,
    ) -> Option<Action>;
}

/// Plays the first legal card (wilds last), draws when stuck, plays the
/// drawn card if it can, otherwise passes. Always declares a last card.
#[derive(Clone, Debug, Default)]
pub struct BaselinePolicy;

impl<E: RulesEngine> MovePolicy<E> for BaselinePolicy {
    fn choose_action(
        &self,
        engine: &E,
        session: &GameSession,
        seat: Seat,
        now_ms: u64,
        _rng: &mut GameRng,
    ) -> Option<Action> {
        let actions = engine.legal_actions(session, seat, now_ms);
        if actions.contains(&Action::DeclareLastCard) {
            return Some(Action::DeclareLastCard);
        }
        if session.current_turn != seat {
            return None;
        }
        let hand = &session.player(seat)?.hand;
        let favorite = favorite_color(session, seat);

        let plays = actions.iter().filter_map(|a| match *a {
            Action::Play { card, .. } => hand.iter().find(|c| c.id == card),
            _ => None,
        });

        let turn = session.turn_state;
        if turn.has_drawn {
            let drawn = turn
                .drawn_card
                .filter(|_| turn.drawn_playable)
                .and_then(|id| plays.clone().find(|c| c.id == id));
            return Some(match drawn {
                Some(card) => Action::Play {
                    card: card.id,
                    declared_color: card.is_wild().then_some(favorite),
                },
                None => Action::Pass {
                    reason: PassReason::NothingPlayable,
                },
            });
        }

        let choice = plays
            .clone()
            .find(|c| !c.is_wild())
            .or_else(|| plays.clone().next());
        Some(match choice {
            Some(card) => Action::Play {
                card: card.id,
                declared_color: card.is_wild().then_some(favorite),
            },
            None => Action::Draw,
        })
    }
}

/// Most common color in the seat's hand; red on an all-wild hand.
fn favorite_color(session: &GameSession, seat: Seat) -> Color {
    let mut counts: FxHashMap<Color, usize> = FxHashMap::default();
    if let Some(player) = session.player(seat) {
        for color in player.hand.iter().filter_map(|c| c.color) {
            *counts.entry(color).or_default() += 1;
        }
    }
    // Ties go to the earlier color in `Color::ALL` for determinism.
    Color::ALL
        .iter()
        .copied()
        .max_by_key(|c| (counts.get(c).copied().unwrap_or(0), Reverse(*c)))
        .unwrap_or(Color::Red)
}

/// Uniform random policy.
///
/// Selects uniformly from legal actions.
#[derive(Clone, Debug, Default)]
pub struct RandomPolicy;

impl<E: RulesEngine> MovePolicy<E> for RandomPolicy {
    fn choose_action(
        &self,
        engine: &E,
        session: &GameSession,
        seat: Seat,
        now_ms: u64,
        rng: &mut GameRng,
    ) -> Option<Action> {
        let actions = engine.legal_actions(session, seat, now_ms);
        rng.choose(&actions).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Face};
    use crate::core::ids::CardId;
    use crate::core::state::{PendingDeclaration, TurnState};
    use crate::games::uno::{UnoGameBuilder, UnoRules};

    fn session_with_hand(cards: Vec<Card>) -> (UnoRules, GameSession) {
        let (rules, mut session) = UnoGameBuilder::new().player_count(2).build(21).unwrap();
        let player = session.player_mut(Seat(0)).unwrap();
        player.hand = cards.into_iter().collect();
        session.discard_pile = crate::zones::Pile::from_cards([Card::number(CardId(900), Color::Red, 7)]);
        session.active_color = Color::Red;
        session.current_turn = Seat(0);
        session.turn_state = TurnState::default();
        (rules, session)
    }

    fn choose(rules: &UnoRules, session: &GameSession) -> Option<Action> {
        BaselinePolicy.choose_action(rules, session, Seat(0), 0, &mut GameRng::new(1))
    }

    #[test]
    fn test_prefers_non_wild() {
        let (rules, session) = session_with_hand(vec![
            Card::wild(CardId(901), Face::Wild),
            Card::number(CardId(902), Color::Red, 2),
        ]);
        assert_eq!(
            choose(&rules, &session),
            Some(Action::Play {
                card: CardId(902),
                declared_color: None
            })
        );
    }

    #[test]
    fn test_wild_declares_favorite() {
        let (rules, session) = session_with_hand(vec![
            Card::wild(CardId(901), Face::Wild),
            Card::number(CardId(902), Color::Blue, 2),
            Card::number(CardId(903), Color::Blue, 3),
            Card::number(CardId(904), Color::Green, 3),
        ]);
        assert_eq!(
            choose(&rules, &session),
            Some(Action::Play {
                card: CardId(901),
                declared_color: Some(Color::Blue)
            })
        );
    }

    #[test]
    fn test_draws_then_passes() {
        let (rules, mut session) =
            session_with_hand(vec![Card::number(CardId(902), Color::Blue, 2)]);
        assert_eq!(choose(&rules, &session), Some(Action::Draw));

        session.turn_state = TurnState {
            has_drawn: true,
            drawn_card: Some(CardId(902)),
            drawn_playable: false,
        };
        assert_eq!(
            choose(&rules, &session),
            Some(Action::Pass {
                reason: PassReason::NothingPlayable
            })
        );
    }

    #[test]
    fn test_declares_first() {
        let (rules, mut session) =
            session_with_hand(vec![Card::number(CardId(902), Color::Red, 2)]);
        session.pending_declaration = Some(PendingDeclaration {
            seat: Seat(0),
            deadline_ms: 10,
        });
        assert_eq!(choose(&rules, &session), Some(Action::DeclareLastCard));
    }

    #[test]
    fn test_idle_off_turn() {
        let (rules, mut session) =
            session_with_hand(vec![Card::number(CardId(902), Color::Red, 2)]);
        session.current_turn = Seat(1);
        assert_eq!(choose(&rules, &session), None);
    }

    #[test]
    fn test_random_policy_picks_legal() {
        let (rules, session) = UnoGameBuilder::new().player_count(3).build(2).unwrap();
        let seat = session.current_turn;
        let legal = rules.legal_actions(&session, seat, 0);
        let mut rng = GameRng::new(5);
        for _ in 0..20 {
            let action = RandomPolicy
                .choose_action(&rules, &session, seat, 0, &mut rng)
                .unwrap();
            assert!(legal.contains(&action));
        }
    }
}
