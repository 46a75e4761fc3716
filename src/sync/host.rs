//! The authoritative participant.
//!
//! The host owns the version counter. Intents, whether local or received
//! over the transport, are applied one at a time under a FIFO mutex:
//! validate, run the rules engine, compare-and-swap the record to
//! `version + 1`, then publish locally and announce.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::channel::{Address, Inbox, Transport};
use super::coordinator::{Coordinator, PhaseCell, Role, SyncPhase};
use super::error::{RejectReason, Rejection, StoreError, SubmitError};
use super::intent::{Envelope, Intent};
use super::record::{RecordStore, SessionRecord};
use crate::core::action::Action;
use crate::core::clock::Clock;
use crate::core::config::SyncConfig;
use crate::core::ids::{IdSource, SessionId};
use crate::core::player::{PlayerId, PlayerSeed};
use crate::core::rng::GameRng;
use crate::core::state::{GameMode, GameSession, SessionStatus};
use crate::games::uno::UnoRules;
use crate::rules::RulesEngine;
use crate::session::{snapshot, SessionStore};

pub struct HostCoordinator {
    session_id: SessionId,
    rules: UnoRules,
    store: SessionStore,
    records: Arc<dyn RecordStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
    phase: PhaseCell,
    apply_lock: Mutex<()>,
}

impl HostCoordinator {
    pub fn new(
        session_id: SessionId,
        rules: UnoRules,
        records: Arc<dyn RecordStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: SyncConfig,
    ) -> Self {
        Self {
            session_id,
            rules,
            store: SessionStore::new(),
            records,
            transport,
            clock,
            config,
            phase: PhaseCell::new(SyncPhase::Disconnected),
            apply_lock: Mutex::new(()),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn rules(&self) -> &UnoRules {
        &self.rules
    }

    // === Lifecycle ===

    /// Create the waiting record at version 0.
    pub async fn open_room(&self) -> Result<(), StoreError> {
        self.records
            .create(SessionRecord::waiting(self.session_id.clone()))
            .await?;
        self.phase.set(SyncPhase::Synced);
        info!(session = %self.session_id, "room opened");
        Ok(())
    }

    /// Deal the session and write it as the first version.
    ///
    /// Opens the room first if nobody did.
    pub async fn start_session(
        &self,
        seeds: &[PlayerSeed],
        mode: GameMode,
        ids: &mut (impl IdSource + Send),
        rng: &mut GameRng,
    ) -> Result<u64, SubmitError> {
        let session = self.rules.create_session(
            self.session_id.clone(),
            seeds,
            mode,
            ids,
            rng,
            self.clock.now_ms(),
        )?;
        let version = self.install(session).await?;
        info!(session = %self.session_id, version, players = seeds.len(), "session started");
        Ok(version)
    }

    /// Write `session` as the record's next version.
    ///
    /// Used to start a freshly dealt session or to restore one from a
    /// snapshot. A record whose session already finished is never
    /// replaced.
    pub async fn install(&self, session: GameSession) -> Result<u64, SubmitError> {
        if session.id != self.session_id {
            return Err(StoreError::NotFound.into());
        }
        snapshot::validate(&session).map_err(StoreError::from)?;

        let _guard = self.apply_lock.lock().await;
        let expected = match self.records.read(&self.session_id).await {
            Ok(record) if record.status == SessionStatus::Finished => {
                warn!(
                    session = %self.session_id,
                    version = record.version,
                    "refusing to replace a finished session"
                );
                return Err(StoreError::Finalized.into());
            }
            Ok(record) => record.version,
            Err(StoreError::NotFound) => {
                self.records
                    .create(SessionRecord::waiting(self.session_id.clone()))
                    .await?;
                0
            }
            Err(err) => return Err(err.into()),
        };

        let version = self.commit(expected, session).await?;
        self.phase.set(SyncPhase::Synced);
        Ok(version)
    }

    // === Intent application ===

    /// Validate and apply one intent. Serialized with every other write.
    pub async fn apply_intent(&self, intent: &Intent) -> Result<u64, Rejection> {
        let _guard = self.apply_lock.lock().await;
        self.phase.set(SyncPhase::Applying);
        let result = self.apply_locked(intent).await;
        self.phase.set(SyncPhase::Synced);

        match &result {
            Ok(version) => info!(
                session = %self.session_id,
                version,
                actor = %intent.actor,
                intent = %intent.id,
                action = intent.action.kind(),
                "intent applied"
            ),
            Err(rejection) => warn!(
                session = %self.session_id,
                actor = %intent.actor,
                intent = %intent.id,
                reason = ?rejection.reason,
                message = %rejection.message,
                "intent rejected"
            ),
        }
        result
    }

    async fn apply_locked(&self, intent: &Intent) -> Result<u64, Rejection> {
        let reject = |reason: RejectReason, message: String| {
            Rejection::new(intent.id, intent.actor.clone(), reason, message)
        };

        if intent.session_id != self.session_id {
            return Err(reject(
                RejectReason::SessionMissing,
                format!("unknown session {}", intent.session_id),
            ));
        }
        let Some(current) = self.store.get() else {
            return Err(reject(RejectReason::SessionMissing, "session not started".into()));
        };
        if current.is_finished() {
            return Err(reject(RejectReason::SessionFinished, "session is over".into()));
        }
        if intent.observed_version < current.version {
            return Err(reject(
                RejectReason::Stale {
                    expected_version: current.version,
                },
                format!(
                    "formed against version {}, host is at {}",
                    intent.observed_version, current.version
                ),
            ));
        }
        let Some(seat) = current.seat_of(&intent.actor) else {
            return Err(reject(RejectReason::NotSeated, format!("{} is not seated", intent.actor)));
        };

        let transition = self
            .rules
            .apply(&current, seat, &intent.action, self.clock.now_ms())
            .map_err(|violation| Rejection::illegal(intent.id, intent.actor.clone(), &violation))?;
        debug!(session = %self.session_id, events = ?transition.events, "transition");

        match self.commit(current.version, transition.session).await {
            Ok(version) => Ok(version),
            Err(StoreError::VersionConflict { actual }) => Err(reject(
                RejectReason::Stale {
                    expected_version: actual,
                },
                format!("record moved to version {actual}"),
            )),
            Err(err) => Err(reject(RejectReason::StoreUnavailable, err.to_string())),
        }
    }

    /// Write `next` as `expected + 1` and publish it.
    ///
    /// On a version conflict the record is re-read and adopted before the
    /// error is returned; on any other failure local state is untouched.
    async fn commit(&self, expected: u64, mut next: GameSession) -> Result<u64, StoreError> {
        next.version = expected + 1;
        let record = SessionRecord::from_session(&next)?;

        match self
            .records
            .write_if_version(&self.session_id, expected, record)
            .await
        {
            Ok(()) => {
                let version = next.version;
                self.store.publish(next);
                Ok(version)
            }
            Err(StoreError::VersionConflict { actual }) => {
                warn!(session = %self.session_id, expected, actual, "record version conflict");
                if let Err(err) = self.adopt_record().await {
                    warn!(session = %self.session_id, error = %err, "re-read after conflict failed");
                }
                Err(StoreError::VersionConflict { actual })
            }
            Err(err) => {
                warn!(session = %self.session_id, error = %err, "record write failed");
                Err(err)
            }
        }
    }

    async fn adopt_record(&self) -> Result<u64, StoreError> {
        let record = self.records.read(&self.session_id).await?;
        if let Some(session) = record.session()? {
            self.store.publish(session);
        }
        Ok(record.version)
    }

    // === Declaration deadlines ===

    /// Penalize an elapsed last-card window now instead of on the next
    /// action. Returns the new version if anything was written.
    pub async fn expire_declarations(&self) -> Result<Option<u64>, SubmitError> {
        let _guard = self.apply_lock.lock().await;
        let Some(current) = self.store.get() else {
            return Ok(None);
        };
        let Some(transition) = self.rules.expire_declaration(&current, self.clock.now_ms()) else {
            return Ok(None);
        };
        let version = self.commit(current.version, transition.session).await?;
        info!(session = %self.session_id, version, "declaration window expired");
        Ok(Some(version))
    }

    /// Sweep for elapsed declaration windows every `sweep_interval` until
    /// the session finishes.
    pub fn spawn_declaration_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(host.config.sweep_interval());
            loop {
                ticker.tick().await;
                if host.store.get().is_some_and(|s| s.is_finished()) {
                    break;
                }
                if let Err(err) = host.expire_declarations().await {
                    warn!(session = %host.session_id, error = %err, "declaration sweep failed");
                }
            }
        })
    }

    // === Transport ===

    /// Handle one envelope from the transport.
    pub async fn handle(&self, envelope: Envelope) {
        let Envelope::Intent(intent) = envelope else {
            debug!(session = %self.session_id, "host ignoring non-intent envelope");
            return;
        };

        match self.apply_intent(&intent).await {
            Ok(version) => self.announce(&intent, version).await,
            Err(rejection) => {
                let Some(to) = intent.reply_to.clone() else {
                    debug!(
                        session = %self.session_id,
                        intent = %intent.id,
                        "rejected intent has no reply address"
                    );
                    return;
                };
                if let Err(err) = self
                    .transport
                    .send(&self.session_id, &to, &Envelope::Rejected(rejection))
                    .await
                {
                    warn!(session = %self.session_id, to = %to, error = %err, "rejection undeliverable");
                }
            }
        }
    }

    async fn announce(&self, intent: &Intent, version: u64) {
        let applied = Envelope::Applied {
            intent_id: intent.id,
            version,
        };
        if let Err(err) = self.transport.broadcast(&self.session_id, &applied).await {
            warn!(session = %self.session_id, error = %err, "applied broadcast failed");
        }
    }

    /// Apply intents from `inbox` until the transport closes.
    pub async fn serve(self: Arc<Self>, mut inbox: Inbox) {
        while let Some(envelope) = inbox.recv().await {
            self.handle(envelope).await;
        }
        debug!(session = %self.session_id, "host inbox closed");
    }

    /// Register the host address and serve it on a background task.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let inbox = self.transport.register(&self.session_id, Address::Host);
        tokio::spawn(Arc::clone(self).serve(inbox))
    }
}

#[async_trait]
impl Coordinator for HostCoordinator {
    fn role(&self) -> Role {
        Role::Host
    }

    fn phase(&self) -> SyncPhase {
        self.phase.get()
    }

    fn session_store(&self) -> &SessionStore {
        &self.store
    }

    async fn submit(
        &self,
        actor: &PlayerId,
        action: Action,
        observed_version: u64,
    ) -> Result<u64, SubmitError> {
        let intent = Intent::new(self.session_id.clone(), actor.clone(), action, observed_version);
        let version = self.apply_intent(&intent).await?;
        self.announce(&intent, version).await;
        Ok(version)
    }

    async fn resync(&self) -> Result<u64, SubmitError> {
        let version = self.adopt_record().await?;
        self.phase.set(SyncPhase::Synced);
        Ok(version)
    }
}
