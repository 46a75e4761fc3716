//! Process-local session holder with change notifications.
//!
//! Every participant process keeps one `SessionStore`. Coordinators publish
//! into it; presentation and automated players subscribe. A published
//! session only replaces the current one when its version is newer, so late
//! or duplicated updates are harmless.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::core::ids::SessionId;
use crate::core::player::{PlayerId, Seat};
use crate::core::state::{GameSession, SessionStatus};

const EVENT_CAPACITY: usize = 256;

/// Whose turn it is, as of a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnNotice {
    pub session_id: SessionId,
    pub seat: Seat,
    pub player_id: PlayerId,
    pub name: String,
    pub is_automated: bool,
    pub version: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A newer state was adopted.
    StateChanged { version: u64 },
    /// Sent with every adopted version of an active session; listeners
    /// that only care about actual seat changes compare `seat`.
    TurnChanged(TurnNotice),
    Finished {
        winner: Option<PlayerId>,
        round_points: Option<u32>,
    },
}

pub struct SessionStore {
    current: RwLock<Option<GameSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            current: RwLock::new(None),
            events,
        }
    }

    /// Snapshot of the current session. Cheap: the session is `im`-backed.
    pub fn get(&self) -> Option<GameSession> {
        self.current.read().clone()
    }

    pub fn version(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.version)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Adopt `session` if it is newer than what we hold.
    ///
    /// Returns whether it was adopted.
    pub fn publish(&self, session: GameSession) -> bool {
        let mut events = Vec::with_capacity(3);
        {
            let mut current = self.current.write();
            if let Some(held) = current.as_ref() {
                if held.version >= session.version {
                    trace!(
                        held = held.version,
                        offered = session.version,
                        "ignoring older session"
                    );
                    return false;
                }
            }

            events.push(SessionEvent::StateChanged {
                version: session.version,
            });
            match session.status {
                SessionStatus::Active => {
                    if let Some(player) = session.current_player() {
                        events.push(SessionEvent::TurnChanged(TurnNotice {
                            session_id: session.id.clone(),
                            seat: session.current_turn,
                            player_id: player.id.clone(),
                            name: player.name.clone(),
                            is_automated: player.is_automated,
                            version: session.version,
                        }));
                    }
                }
                SessionStatus::Finished => events.push(SessionEvent::Finished {
                    winner: session.winner.clone(),
                    round_points: session.round_points,
                }),
                SessionStatus::Waiting => {}
            }
            *current = Some(session);
        }

        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        true
    }
}
