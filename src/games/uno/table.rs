//! Working copy used while applying one operation.
//!
//! A `Table` owns a clone of the session plus a live RNG rebuilt from the
//! session's serialized RNG state. Operations mutate the table freely; on
//! success `finish` writes the RNG back and yields the `Transition`, on
//! failure the table is simply dropped.

use smallvec::SmallVec;
use tracing::trace;

use crate::cards::Card;
use crate::core::action::MoveKind;
use crate::core::ids::CardId;
use crate::core::player::Seat;
use crate::core::rng::GameRng;
use crate::core::state::{GameSession, TurnState};
use crate::rules::{GameEvent, Transition};

pub(crate) struct Table {
    pub session: GameSession,
    pub rng: GameRng,
    pub events: Vec<GameEvent>,
    pub now_ms: u64,
}

impl Table {
    pub fn open(session: &GameSession, now_ms: u64) -> Self {
        Self {
            rng: GameRng::from_state(&session.rng),
            session: session.clone(),
            events: Vec::new(),
            now_ms,
        }
    }

    pub fn finish(mut self) -> Transition {
        self.session.rng = self.rng.state();
        Transition {
            session: self.session,
            events: self.events,
        }
    }

    /// Refill an empty draw pile from everything under the discard top.
    ///
    /// Returns false when there is nothing to refill with.
    pub fn restock(&mut self) -> bool {
        let rest = self.session.discard_pile.take_all_but_top();
        if rest.is_empty() {
            return false;
        }

        let count = rest.len();
        for card in rest {
            self.session.draw_pile.push(card);
        }
        self.session.draw_pile.shuffle(&mut self.rng);

        let seat = self.session.current_turn;
        self.session.record(seat, MoveKind::Restock, &[], self.now_ms);
        self.events.push(GameEvent::Restocked { cards: count });
        trace!(cards = count, "restocked draw pile");
        true
    }

    /// Pop one card, restocking first if the draw pile is empty.
    pub fn draw_one(&mut self) -> Option<Card> {
        if self.session.draw_pile.is_empty() && !self.restock() {
            return None;
        }
        self.session.draw_pile.pop()
    }

    /// Give `seat` up to `count` cards. Stops quietly when both piles run dry.
    pub fn deal_to(&mut self, seat: Seat, count: usize) -> SmallVec<[CardId; 4]> {
        let mut drawn = SmallVec::new();
        for _ in 0..count {
            let Some(card) = self.draw_one() else {
                break;
            };
            if let Some(player) = self.session.player_mut(seat) {
                player.hand.push_back(card);
            }
            drawn.push(card.id);
        }
        drawn
    }

    /// Forced draw from a draw-two / wild-draw-four.
    pub fn force_draw(&mut self, seat: Seat, count: usize) {
        let drawn = self.deal_to(seat, count);
        self.session
            .record(seat, MoveKind::ForcedDraw, &drawn, self.now_ms);
        self.events.push(GameEvent::ForcedDraw {
            seat,
            count: drawn.len(),
        });
    }

    /// Move the turn `steps` seats in the current direction.
    pub fn advance(&mut self, steps: usize) {
        let next = self.session.seat_after(steps);
        self.session.current_turn = next;
        self.session.turn_state = TurnState::default();
        self.events.push(GameEvent::TurnChanged { seat: next });
    }

    /// Resolve an armed last-card obligation with a penalty draw.
    ///
    /// Called at the start of every draw, play and pass; anyone acting while
    /// the obligation is armed means the window was missed.
    pub fn settle_declaration(&mut self, penalty: usize) {
        let Some(pending) = self.session.pending_declaration.take() else {
            return;
        };

        let drawn = self.deal_to(pending.seat, penalty);
        if let Some(player) = self.session.player_mut(pending.seat) {
            player.must_declare_last_card = false;
        }
        self.session
            .record(pending.seat, MoveKind::Penalty, &drawn, self.now_ms);
        self.events.push(GameEvent::Penalized {
            seat: pending.seat,
            count: drawn.len(),
        });
        trace!(seat = pending.seat.0, cards = drawn.len(), "last-card penalty");
    }
}
