//! A non-host participant.
//!
//! Peers never apply intents. They forward them to the host and wait for
//! `Applied` or `Rejected`, and keep their local session current from the
//! record feed, the host's announcements, and a periodic poll.
//!
//! A stale rejection raises the peer's version floor: the lowest version
//! the host is known to hold. The peer stays `Stale` until its local copy
//! reaches the floor, and never stamps a new intent below it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use super::channel::{Address, Inbox, Transport};
use super::coordinator::{Coordinator, PhaseCell, Role, SyncPhase};
use super::error::{RejectReason, Rejection, StoreError, SubmitError};
use super::intent::{Envelope, Intent, IntentId};
use super::record::{RecordStore, SessionRecord};
use crate::core::action::Action;
use crate::core::config::SyncConfig;
use crate::core::ids::SessionId;
use crate::core::player::PlayerId;
use crate::session::SessionStore;

#[derive(Debug)]
enum Outcome {
    Applied(u64),
    Rejected(Rejection),
}

pub struct PeerCoordinator {
    session_id: SessionId,
    me: PlayerId,
    store: SessionStore,
    records: Arc<dyn RecordStore>,
    transport: Arc<dyn Transport>,
    config: SyncConfig,
    phase: PhaseCell,
    pending: DashMap<IntentId, oneshot::Sender<Outcome>>,
    floor: AtomicU64,
}

impl PeerCoordinator {
    pub fn new(
        session_id: SessionId,
        me: PlayerId,
        records: Arc<dyn RecordStore>,
        transport: Arc<dyn Transport>,
        config: SyncConfig,
    ) -> Self {
        Self {
            session_id,
            me,
            store: SessionStore::new(),
            records,
            transport,
            config,
            phase: PhaseCell::new(SyncPhase::Disconnected),
            pending: DashMap::new(),
            floor: AtomicU64::new(0),
        }
    }

    pub fn me(&self) -> &PlayerId {
        &self.me
    }

    /// Register with the transport, subscribe to the record, fetch it, and
    /// start the background pump.
    pub async fn join(self: &Arc<Self>) -> Result<JoinHandle<()>, SubmitError> {
        self.phase.set(SyncPhase::Joining);
        let inbox = self
            .transport
            .register(&self.session_id, Address::Participant(self.me.clone()));
        // Subscribe before reading so nothing slips between the two.
        let feed = self.records.subscribe(&self.session_id);

        let version = match self.fetch().await {
            Ok(version) => version,
            Err(err) => {
                self.phase.set(SyncPhase::Disconnected);
                return Err(err.into());
            }
        };
        self.phase.set(SyncPhase::Synced);
        info!(session = %self.session_id, me = %self.me, version, "joined");

        Ok(tokio::spawn(Arc::clone(self).pump(inbox, feed)))
    }

    async fn pump(self: Arc<Self>, mut inbox: Inbox, mut feed: broadcast::Receiver<SessionRecord>) {
        let mut poll = tokio::time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        poll.tick().await;
        let mut feed_open = true;

        loop {
            tokio::select! {
                envelope = inbox.recv() => match envelope {
                    Some(envelope) => self.on_envelope(envelope).await,
                    None => break,
                },
                update = feed.recv(), if feed_open => match update {
                    Ok(record) => self.on_record(record),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(session = %self.session_id, skipped, "record feed lagged");
                        self.refresh().await;
                    }
                    Err(RecvError::Closed) => {
                        warn!(session = %self.session_id, "record feed closed, polling only");
                        feed_open = false;
                    }
                },
                _ = poll.tick() => self.refresh().await,
            }
        }

        self.phase.set(SyncPhase::Disconnected);
        debug!(session = %self.session_id, me = %self.me, "peer inbox closed");
    }

    fn local_version(&self) -> Option<u64> {
        self.store.version()
    }

    fn is_behind(&self, version: u64) -> bool {
        self.local_version().map_or(true, |local| local < version)
    }

    /// Lowest version the host is known to hold.
    pub fn version_floor(&self) -> u64 {
        self.floor.load(Ordering::SeqCst)
    }

    fn raise_floor(&self, version: u64) {
        let previous = self.floor.fetch_max(version, Ordering::SeqCst);
        if version > previous {
            debug!(
                session = %self.session_id,
                me = %self.me,
                floor = version,
                "version floor raised"
            );
        }
    }

    fn caught_up(&self) -> bool {
        !self.is_behind(self.version_floor())
    }

    /// Leave or enter `Stale` depending on whether the local copy has
    /// reached the floor.
    fn settle(&self) {
        match (self.phase.get(), self.caught_up()) {
            (SyncPhase::Stale, true) => self.phase.set(SyncPhase::Synced),
            (SyncPhase::Synced, false) => self.phase.set(SyncPhase::Stale),
            _ => {}
        }
    }

    fn on_record(&self, record: SessionRecord) {
        if !self.is_behind(record.version) {
            return;
        }
        match record.session() {
            Ok(Some(session)) => {
                self.store.publish(session);
                self.settle();
            }
            Ok(None) => {}
            Err(err) => warn!(session = %self.session_id, error = %err, "bad record on feed"),
        }
    }

    async fn on_envelope(&self, envelope: Envelope) {
        match envelope {
            Envelope::Applied { intent_id, version } => {
                let waiter = self.pending.remove(&intent_id);
                if waiter.is_some() {
                    self.raise_floor(version);
                }
                if self.is_behind(version) {
                    self.refresh().await;
                }
                if let Some((_, waiter)) = waiter {
                    let _ = waiter.send(Outcome::Applied(version));
                }
            }
            Envelope::Rejected(rejection) => {
                let waiter = self.pending.remove(&rejection.intent_id);
                if let RejectReason::Stale { expected_version } = rejection.reason {
                    self.raise_floor(expected_version);
                    if self.is_behind(expected_version) {
                        self.phase.set(SyncPhase::Stale);
                        self.refresh().await;
                    }
                }
                match waiter {
                    Some((_, waiter)) => {
                        let _ = waiter.send(Outcome::Rejected(rejection));
                    }
                    None => trace!(
                        session = %self.session_id,
                        intent = %rejection.intent_id,
                        "rejection for an intent no longer pending"
                    ),
                }
            }
            Envelope::Intent(_) => {
                trace!(session = %self.session_id, "peer ignoring intent envelope");
            }
        }
    }

    /// Pull the record and adopt it if newer. Returns the local version
    /// afterwards.
    async fn fetch(&self) -> Result<u64, StoreError> {
        let record = self.records.read(&self.session_id).await?;
        if let Some(session) = record.session()? {
            self.store.publish(session);
        }
        Ok(self.local_version().unwrap_or(record.version))
    }

    async fn refresh(&self) {
        match self.fetch().await {
            Ok(version) => {
                self.settle();
                if !self.caught_up() {
                    debug!(
                        session = %self.session_id,
                        version,
                        floor = self.version_floor(),
                        "record still behind the floor"
                    );
                }
            }
            Err(err) => warn!(session = %self.session_id, error = %err, "refresh failed"),
        }
    }
}

#[async_trait]
impl Coordinator for PeerCoordinator {
    fn role(&self) -> Role {
        Role::Peer
    }

    fn phase(&self) -> SyncPhase {
        self.phase.get()
    }

    fn session_store(&self) -> &SessionStore {
        &self.store
    }

    fn observed_version(&self) -> u64 {
        self.local_version().unwrap_or(0).max(self.version_floor())
    }

    async fn submit(
        &self,
        actor: &PlayerId,
        action: Action,
        observed_version: u64,
    ) -> Result<u64, SubmitError> {
        if matches!(self.phase.get(), SyncPhase::Disconnected | SyncPhase::Joining) {
            return Err(SubmitError::NotJoined);
        }

        let intent = Intent::new(self.session_id.clone(), actor.clone(), action, observed_version)
            .reply_to(Address::Participant(self.me.clone()));
        let intent_id = intent.id;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(intent_id, tx);

        if let Err(err) = self
            .transport
            .send(&self.session_id, &Address::Host, &Envelope::Intent(intent))
            .await
        {
            self.pending.remove(&intent_id);
            return Err(err.into());
        }

        match tokio::time::timeout(self.config.submit_timeout(), rx).await {
            Ok(Ok(Outcome::Applied(version))) => Ok(version),
            Ok(Ok(Outcome::Rejected(rejection))) => Err(rejection.into()),
            Ok(Err(_)) | Err(_) => {
                self.pending.remove(&intent_id);
                warn!(
                    session = %self.session_id,
                    intent = %intent_id,
                    action = action.kind(),
                    "intent unresolved, resyncing"
                );
                self.phase.set(SyncPhase::Stale);
                if let Err(err) = self.resync().await {
                    warn!(session = %self.session_id, error = %err, "resync after timeout failed");
                }
                Err(SubmitError::Unresolved { intent_id })
            }
        }
    }

    /// Re-fetch the record. The phase only returns to `Synced` once the
    /// fetched version reaches the floor; until then the pump keeps polling.
    async fn resync(&self) -> Result<u64, SubmitError> {
        self.phase.set(SyncPhase::Stale);
        let version = self.fetch().await?;
        self.settle();
        Ok(version)
    }
}
