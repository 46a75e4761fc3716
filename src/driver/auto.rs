//! Automated seats driven through a coordinator.
//!
//! An `AutoPlayer` has no back door: it watches the session store like a
//! presentation layer would and submits intents through the same
//! `Coordinator` calls a human uses.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::policy::MovePolicy;
use crate::core::action::Action;
use crate::core::clock::Clock;
use crate::core::config::DriverConfig;
use crate::core::player::PlayerId;
use crate::core::rng::GameRng;
use crate::core::state::GameSession;
use crate::games::uno::UnoRules;
use crate::rules::{GameResult, RulesEngine};
use crate::sync::{Coordinator, RejectReason};

pub struct AutoPlayer<P> {
    coordinator: Arc<dyn Coordinator>,
    rules: UnoRules,
    players: Vec<PlayerId>,
    policy: P,
    clock: Arc<dyn Clock>,
    config: DriverConfig,
    rng: GameRng,
}

impl<P: MovePolicy<UnoRules> + 'static> AutoPlayer<P> {
    pub fn new(
        coordinator: Arc<dyn Coordinator>,
        rules: UnoRules,
        players: Vec<PlayerId>,
        policy: P,
        clock: Arc<dyn Clock>,
        config: DriverConfig,
        seed: u64,
    ) -> Self {
        Self {
            coordinator,
            rules,
            players,
            policy,
            clock,
            config,
            rng: GameRng::new(seed),
        }
    }

    pub fn spawn(self) -> JoinHandle<Option<GameResult>> {
        tokio::spawn(self.run())
    }

    /// Act for the controlled players until the session finishes.
    ///
    /// At most one action per observed version. Returns `None` if the
    /// session store goes away first.
    pub async fn run(mut self) -> Option<GameResult> {
        let mut events = self.coordinator.session_store().subscribe();
        let mut handled = None;

        loop {
            if let Some(session) = self.coordinator.session_store().get() {
                if let Some(result) = self.rules.is_terminal(&session) {
                    return Some(result);
                }
                if handled != Some(session.version) {
                    handled = Some(session.version);
                    self.act(&session).await;
                    continue;
                }
            }

            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    }

    async fn act(&mut self, session: &GameSession) {
        for player in &self.players {
            let Some(seat) = session.seat_of(player) else {
                continue;
            };
            let now = self.clock.now_ms();
            let Some(action) =
                self.policy
                    .choose_action(&self.rules, session, seat, now, &mut self.rng)
            else {
                continue;
            };

            let delay = self.config.think_delay();
            if action != Action::DeclareLastCard && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            // Pinned to the version the choice was made on; if the session
            // moved during the delay the host refuses it as stale.
            match self.coordinator.submit(player, action, session.version).await {
                Ok(version) => debug!(actor = %player, action = action.kind(), version, "automated move"),
                Err(err) if err.reject_reason().is_some_and(RejectReason::is_stale) => {
                    debug!(actor = %player, action = action.kind(), error = %err, "automated move overtaken");
                }
                Err(err) => warn!(actor = %player, action = action.kind(), error = %err, "automated move failed"),
            }
            return;
        }
    }
}
