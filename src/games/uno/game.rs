//! Uno rules.

use rustc_hash::FxHashSet;
use tracing::debug;

use super::table::Table;
use crate::cards::{shuffled_deck, Card, Color, Face, STANDARD_DECK_SIZE};
use crate::core::action::{Action, MoveKind, PassReason};
use crate::core::config::RulesConfig;
use crate::core::ids::{CardId, IdSource, SequentialIds, SessionId};
use crate::core::player::{Player, PlayerId, PlayerSeed, Seat};
use crate::core::rng::GameRng;
use crate::core::state::{
    GameMode, GameSession, PendingDeclaration, SessionStatus, TurnState,
};
use crate::rules::{GameEvent, GameResult, RuleViolation, RulesEngine, Transition};
use crate::zones::{Pile, ZonePosition};

/// The Uno rules engine.
///
/// Stateless apart from its configuration; every operation takes the
/// session by reference and returns a new one.
#[derive(Clone, Debug, Default)]
pub struct UnoRules {
    config: RulesConfig,
}

/// Builder for a rules engine plus a freshly dealt session.
pub struct UnoGameBuilder {
    player_count: usize,
    config: RulesConfig,
    mode: GameMode,
    session_id: SessionId,
    started_at_ms: u64,
}

impl Default for UnoGameBuilder {
    fn default() -> Self {
        Self {
            player_count: 2,
            config: RulesConfig::default(),
            mode: GameMode::Local,
            session_id: SessionId::new("local"),
            started_at_ms: 0,
        }
    }
}

impl UnoGameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_count(mut self, count: usize) -> Self {
        self.player_count = count;
        self
    }

    pub fn config(mut self, config: RulesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = SessionId::new(id);
        self
    }

    pub fn started_at(mut self, now_ms: u64) -> Self {
        self.started_at_ms = now_ms;
        self
    }

    /// Build the engine and deal a session with players `p_1..p_n`.
    pub fn build(self, seed: u64) -> Result<(UnoRules, GameSession), RuleViolation> {
        let rules = UnoRules::new(self.config);
        let seeds: Vec<PlayerSeed> = Seat::all(self.player_count)
            .map(|seat| {
                let id = PlayerId::for_seat(seat);
                let name = format!("Player {}", seat.0 as u32 + 1);
                PlayerSeed::human(id.0, name)
            })
            .collect();

        let mut ids = SequentialIds::new();
        let mut rng = GameRng::new(seed);
        let session = rules.create_session(
            self.session_id,
            &seeds,
            self.mode,
            &mut ids,
            &mut rng,
            self.started_at_ms,
        )?;
        Ok((rules, session))
    }
}

impl UnoRules {
    #[must_use]
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    // === Session setup ===

    /// Deal a new session.
    ///
    /// The deck is shuffled with `rng`, dealt round-robin, and a non-wild
    /// starter is flipped. The rng's continuation is stored in the session
    /// so later reshuffles replicate with the record.
    pub fn create_session(
        &self,
        id: SessionId,
        seeds: &[PlayerSeed],
        mode: GameMode,
        ids: &mut impl IdSource,
        rng: &mut GameRng,
        now_ms: u64,
    ) -> Result<GameSession, RuleViolation> {
        let count = seeds.len();
        let (min, max) = (self.config.min_players, self.config.max_players);
        if count < min || count > max || count * self.config.hand_size >= STANDARD_DECK_SIZE {
            return Err(RuleViolation::InvalidPlayerCount { count, min, max });
        }

        let mut seen = FxHashSet::default();
        for seed in seeds {
            if !seen.insert(&seed.id) {
                return Err(RuleViolation::DuplicatePlayer(seed.id.clone()));
            }
        }

        let mut players: Vec<Player> = seeds.iter().cloned().map(Player::from_seed).collect();
        let mut deck = shuffled_deck(ids, rng);
        let deck_size = deck.len();
        for _ in 0..self.config.hand_size {
            for player in players.iter_mut() {
                let card = deck.pop().ok_or(RuleViolation::NoCardsLeft)?;
                player.hand.push_back(card);
            }
        }

        let mut draw_pile = Pile::from_cards(deck);
        let (starter, color) = loop {
            let card = draw_pile.pop().ok_or(RuleViolation::NoCardsLeft)?;
            if let Some(color) = card.color {
                break (card, color);
            }
            draw_pile.put(card, ZonePosition::Bottom);
            draw_pile.shuffle(rng);
        };

        let session = GameSession {
            id,
            mode,
            players: players.into_iter().collect(),
            draw_pile,
            discard_pile: Pile::from_cards([starter]),
            deck_size,
            current_turn: Seat(0),
            direction: 1,
            active_color: color,
            winner: None,
            round_points: None,
            history: im::Vector::new(),
            turn_state: TurnState::default(),
            pending_declaration: None,
            version: 0,
            status: SessionStatus::Active,
            rng: rng.state(),
            started_at_ms: now_ms,
        };

        let mut table = Table::open(&session, now_ms);
        table.session.record(
            Seat(0),
            MoveKind::Starter {
                label: starter.face.label(),
            },
            &[starter.id],
            now_ms,
        );
        match starter.face {
            Face::Skip => table.advance(1),
            Face::Reverse => {
                table.session.direction = -table.session.direction;
                table.events.push(GameEvent::Reversed {
                    direction: table.session.direction,
                });
            }
            Face::DrawTwo => {
                let target = table.session.seat_after(1);
                table.force_draw(target, Face::DrawTwo.forced_draw());
                table.advance(2);
            }
            _ => {}
        }

        let session = table.finish().session;
        debug!(
            session = %session.id,
            players = count,
            starter = %starter,
            turn = session.current_turn.0,
            "session created"
        );
        Ok(session)
    }

    // === Operations ===

    /// Draw one card. Does not end the turn.
    pub fn draw(
        &self,
        session: &GameSession,
        actor: Seat,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation> {
        self.ensure_turn(session, actor)?;
        if session.turn_state.has_drawn {
            return Err(RuleViolation::AlreadyDrew);
        }

        let mut table = Table::open(session, now_ms);
        table.settle_declaration(self.config.declaration_penalty);

        let card = table.draw_one().ok_or(RuleViolation::NoCardsLeft)?;
        let player = table
            .session
            .player_mut(actor)
            .ok_or(RuleViolation::NotYourTurn)?;
        player.hand.push_back(card);

        let playable = self.is_legal(&card, &table.session, Some(actor));
        table.session.turn_state = TurnState {
            has_drawn: true,
            drawn_card: Some(card.id),
            drawn_playable: playable,
        };
        table.session.record(actor, MoveKind::Draw, &[card.id], now_ms);
        table.events.push(GameEvent::Drew {
            seat: actor,
            card: card.id,
            playable,
        });
        Ok(table.finish())
    }

    /// Play a card from hand.
    pub fn play(
        &self,
        session: &GameSession,
        actor: Seat,
        card_id: CardId,
        declared_color: Option<Color>,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation> {
        self.ensure_turn(session, actor)?;

        // Legality is judged on the hand the player saw, before any penalty.
        let card = session
            .player(actor)
            .and_then(|p| p.card(card_id))
            .copied()
            .ok_or(RuleViolation::CardNotInHand(card_id))?;

        let active_color = match (card.color, declared_color) {
            (Some(color), _) => color,
            (None, Some(color)) => color,
            (None, None) => return Err(RuleViolation::MissingColorDeclaration),
        };
        if let Some(top) = session.top_card() {
            if !card.matches(top, session.active_color) {
                return Err(RuleViolation::CardNotPlayable(card_id));
            }
        }
        if card.face == Face::WildDrawFour && holds_color(session, actor, card_id) {
            return Err(RuleViolation::WildDrawFourHasColorMatch);
        }

        let mut table = Table::open(session, now_ms);
        table.settle_declaration(self.config.declaration_penalty);

        let player = table
            .session
            .player_mut(actor)
            .ok_or(RuleViolation::NotYourTurn)?;
        player.take_card(card_id);
        let remaining = player.hand_size();

        table.session.discard_pile.push(card);
        table.session.active_color = active_color;
        table.session.record(
            actor,
            MoveKind::Play {
                label: card.face.label(),
            },
            &[card.id],
            now_ms,
        );
        table.events.push(GameEvent::Played {
            seat: actor,
            card,
            active_color,
        });

        if remaining == 0 {
            self.finish_round(&mut table, actor);
            return Ok(table.finish());
        }

        self.apply_effect(&mut table, &card);

        if remaining == 1 {
            let deadline_ms = now_ms + self.config.declaration_window_ms;
            table.session.pending_declaration = Some(PendingDeclaration {
                seat: actor,
                deadline_ms,
            });
            if let Some(player) = table.session.player_mut(actor) {
                player.must_declare_last_card = true;
            }
        }
        Ok(table.finish())
    }

    /// End the turn after drawing.
    pub fn pass(
        &self,
        session: &GameSession,
        actor: Seat,
        reason: PassReason,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation> {
        self.ensure_turn(session, actor)?;
        if !session.turn_state.has_drawn {
            return Err(RuleViolation::MustDrawFirst);
        }

        let mut table = Table::open(session, now_ms);
        table.settle_declaration(self.config.declaration_penalty);
        table
            .session
            .record(actor, MoveKind::Pass { reason }, &[], now_ms);
        table.events.push(GameEvent::Passed { seat: actor });
        table.advance(1);
        Ok(table.finish())
    }

    /// Announce a last card inside the window. Allowed out of turn.
    pub fn declare_last_card(
        &self,
        session: &GameSession,
        actor: Seat,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation> {
        if session.status != SessionStatus::Active {
            return Err(RuleViolation::GameOver);
        }
        let pending = session
            .pending_declaration
            .filter(|p| p.seat == actor)
            .ok_or(RuleViolation::NoPendingDeclaration)?;
        if pending.is_expired(now_ms) {
            return Err(RuleViolation::DeclarationExpired);
        }

        let mut table = Table::open(session, now_ms);
        table.session.pending_declaration = None;
        if let Some(player) = table.session.player_mut(actor) {
            player.must_declare_last_card = false;
        }
        table
            .session
            .record(actor, MoveKind::DeclareLastCard, &[], now_ms);
        table.events.push(GameEvent::Declared { seat: actor });
        Ok(table.finish())
    }

    /// Apply the penalty for an elapsed declaration window right away.
    ///
    /// `None` when there is nothing to resolve.
    pub fn expire_declaration(&self, session: &GameSession, now_ms: u64) -> Option<Transition> {
        if session.status != SessionStatus::Active {
            return None;
        }
        let pending = session.pending_declaration?;
        if !pending.is_expired(now_ms) {
            return None;
        }

        let mut table = Table::open(session, now_ms);
        table.settle_declaration(self.config.declaration_penalty);
        Some(table.finish())
    }

    // === Queries ===

    /// Whether `card` could be played on the current discard.
    ///
    /// With `acting` set, a wild draw four additionally requires that the
    /// acting player holds no other card of the active color.
    #[must_use]
    pub fn is_legal(&self, card: &Card, session: &GameSession, acting: Option<Seat>) -> bool {
        let Some(top) = session.top_card() else {
            return true;
        };
        if !card.matches(top, session.active_color) {
            return false;
        }
        match (card.face, acting) {
            (Face::WildDrawFour, Some(seat)) => !holds_color(session, seat, card.id),
            _ => true,
        }
    }

    /// Opponents' remaining hand value for a winner at `seat`.
    #[must_use]
    pub fn round_points(&self, session: &GameSession, winner: Seat) -> u32 {
        session
            .seats()
            .filter(|&seat| seat != winner)
            .filter_map(|seat| session.player(seat))
            .map(Player::hand_points)
            .sum()
    }

    // === Internals ===

    fn ensure_turn(&self, session: &GameSession, actor: Seat) -> Result<(), RuleViolation> {
        if session.status != SessionStatus::Active {
            return Err(RuleViolation::GameOver);
        }
        if session.current_turn != actor || session.player(actor).is_none() {
            return Err(RuleViolation::NotYourTurn);
        }
        Ok(())
    }

    fn apply_effect(&self, table: &mut Table, card: &Card) {
        match card.face {
            Face::Number(_) | Face::Wild => table.advance(1),
            Face::Skip => {
                let skipped = table.session.seat_after(1);
                table.events.push(GameEvent::Skipped { seat: skipped });
                table.advance(2);
            }
            Face::Reverse => {
                table.session.direction = -table.session.direction;
                table.events.push(GameEvent::Reversed {
                    direction: table.session.direction,
                });
                let steps = if table.session.player_count() == 2 { 2 } else { 1 };
                table.advance(steps);
            }
            Face::DrawTwo | Face::WildDrawFour => {
                let target = table.session.seat_after(1);
                table.force_draw(target, card.face.forced_draw());
                table.advance(2);
            }
        }
    }

    fn finish_round(&self, table: &mut Table, winner: Seat) {
        let points = self.round_points(&table.session, winner);
        let session = &mut table.session;
        session.winner = session.player(winner).map(|p| p.id.clone());
        session.round_points = Some(points);
        session.status = SessionStatus::Finished;
        session.pending_declaration = None;
        session.turn_state = TurnState::default();
        for player in session.players.iter_mut() {
            player.must_declare_last_card = false;
        }
        table.events.push(GameEvent::Won {
            seat: winner,
            round_points: points,
        });
        debug!(session = %table.session.id, seat = winner.0, points, "round won");
    }
}

/// Whether `seat` holds a card of the active color other than `except`.
fn holds_color(session: &GameSession, seat: Seat, except: CardId) -> bool {
    session.player(seat).is_some_and(|p| {
        p.hand
            .iter()
            .any(|c| c.id != except && c.color == Some(session.active_color))
    })
}

impl RulesEngine for UnoRules {
    fn config(&self) -> &RulesConfig {
        &self.config
    }

    fn legal_actions(&self, session: &GameSession, seat: Seat, now_ms: u64) -> Vec<Action> {
        let mut actions = Vec::new();
        if session.status != SessionStatus::Active {
            return actions;
        }

        if session
            .pending_declaration
            .is_some_and(|p| p.seat == seat && !p.is_expired(now_ms))
        {
            actions.push(Action::DeclareLastCard);
        }
        if session.current_turn != seat {
            return actions;
        }
        let Some(player) = session.player(seat) else {
            return actions;
        };

        for card in player.hand.iter() {
            if !self.is_legal(card, session, Some(seat)) {
                continue;
            }
            if card.is_wild() {
                actions.extend(Color::ALL.iter().map(|&color| Action::Play {
                    card: card.id,
                    declared_color: Some(color),
                }));
            } else {
                actions.push(Action::Play {
                    card: card.id,
                    declared_color: None,
                });
            }
        }

        if session.turn_state.has_drawn {
            let reason = if session.turn_state.drawn_playable {
                PassReason::Voluntary
            } else {
                PassReason::NothingPlayable
            };
            actions.push(Action::Pass { reason });
        } else {
            actions.push(Action::Draw);
        }
        actions
    }

    fn apply(
        &self,
        session: &GameSession,
        seat: Seat,
        action: &Action,
        now_ms: u64,
    ) -> Result<Transition, RuleViolation> {
        match *action {
            Action::Draw => self.draw(session, seat, now_ms),
            Action::Play {
                card,
                declared_color,
            } => self.play(session, seat, card, declared_color, now_ms),
            Action::Pass { reason } => self.pass(session, seat, reason, now_ms),
            Action::DeclareLastCard => self.declare_last_card(session, seat, now_ms),
        }
    }

    fn is_terminal(&self, session: &GameSession) -> Option<GameResult> {
        if !session.is_finished() {
            return None;
        }
        Some(GameResult {
            winner: session.winner.clone()?,
            round_points: session.round_points.unwrap_or(0),
        })
    }
}
