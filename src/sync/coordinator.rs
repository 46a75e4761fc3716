//! The surface every participant acts through.
//!
//! Humans, automated players and tests all call the same `Coordinator`
//! methods; whether the intent is applied locally (host) or forwarded
//! (peer) is the implementation's business.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::SubmitError;
use crate::cards::Color;
use crate::core::action::{Action, PassReason};
use crate::core::ids::CardId;
use crate::core::player::PlayerId;
use crate::session::SessionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Peer,
}

/// Replication phase of one participant process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Disconnected,
    Joining,
    Synced,
    /// Known to be behind; a re-fetch is in progress or due.
    Stale,
    /// Host only: an intent is being validated and written.
    Applying,
}

/// Shared phase cell.
#[derive(Debug)]
pub(crate) struct PhaseCell(RwLock<SyncPhase>);

impl PhaseCell {
    pub fn new(phase: SyncPhase) -> Self {
        Self(RwLock::new(phase))
    }

    pub fn get(&self) -> SyncPhase {
        *self.0.read()
    }

    pub fn set(&self, phase: SyncPhase) {
        *self.0.write() = phase;
    }
}

#[async_trait]
pub trait Coordinator: Send + Sync {
    fn role(&self) -> Role;

    fn phase(&self) -> SyncPhase;

    /// Local view of the session.
    fn session_store(&self) -> &SessionStore;

    /// Version new intents are stamped with when the caller did not pin
    /// one.
    fn observed_version(&self) -> u64 {
        self.session_store().version().unwrap_or(0)
    }

    /// Submit `action` on behalf of `actor`, formed against
    /// `observed_version`. Resolves to the version that applied it.
    async fn submit(
        &self,
        actor: &PlayerId,
        action: Action,
        observed_version: u64,
    ) -> Result<u64, SubmitError>;

    /// Re-fetch the authoritative record. Returns the adopted version.
    async fn resync(&self) -> Result<u64, SubmitError>;

    // === Convenience Methods ===
    //
    // These stamp the participant's current view.

    async fn draw(&self, actor: &PlayerId) -> Result<u64, SubmitError> {
        self.submit(actor, Action::Draw, self.observed_version()).await
    }

    async fn play(
        &self,
        actor: &PlayerId,
        card: CardId,
        declared_color: Option<Color>,
    ) -> Result<u64, SubmitError> {
        self.submit(
            actor,
            Action::Play {
                card,
                declared_color,
            },
            self.observed_version(),
        )
        .await
    }

    async fn pass(&self, actor: &PlayerId, reason: PassReason) -> Result<u64, SubmitError> {
        self.submit(actor, Action::Pass { reason }, self.observed_version())
            .await
    }

    async fn declare_last_card(&self, actor: &PlayerId) -> Result<u64, SubmitError> {
        self.submit(actor, Action::DeclareLastCard, self.observed_version())
            .await
    }
}
