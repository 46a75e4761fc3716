//! The replicated session record and the stores that hold it.
//!
//! A record is a single document: id, status, version, and the session
//! state as JSON. There is no log; the latest successful write is the only
//! truth. Writers must compare-and-swap on `version`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use super::error::StoreError;
use crate::core::ids::SessionId;
use crate::core::state::{GameSession, SessionStatus};
use crate::session::snapshot;

const FEED_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub status: SessionStatus,
    pub version: u64,
    /// `None` while the room is waiting for players.
    pub state: Option<Value>,
}

impl SessionRecord {
    /// An empty room at version 0.
    pub fn waiting(id: SessionId) -> Self {
        Self {
            id,
            status: SessionStatus::Waiting,
            version: 0,
            state: None,
        }
    }

    pub fn from_session(session: &GameSession) -> Result<Self, StoreError> {
        Ok(Self {
            id: session.id.clone(),
            status: session.status,
            version: session.version,
            state: Some(snapshot::export(session)?),
        })
    }

    /// Decode the carried session, if any.
    pub fn session(&self) -> Result<Option<GameSession>, StoreError> {
        let Some(state) = self.state.clone() else {
            return Ok(None);
        };
        let session = snapshot::import(state)?;
        Ok(Some(session))
    }
}

/// A store offering atomic compare-and-swap on the record version.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, record: SessionRecord) -> Result<(), StoreError>;

    async fn read(&self, id: &SessionId) -> Result<SessionRecord, StoreError>;

    /// Replace the record only if it still holds `expected`.
    ///
    /// Fails with `VersionConflict { actual }` otherwise.
    async fn write_if_version(
        &self,
        id: &SessionId,
        expected: u64,
        record: SessionRecord,
    ) -> Result<(), StoreError>;

    /// Feed of every successfully written record for `id`.
    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord>;
}

/// Registry of per-session change feeds.
#[derive(Default)]
struct Feeds {
    senders: DashMap<SessionId, broadcast::Sender<SessionRecord>>,
}

impl Feeds {
    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord> {
        self.senders
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    fn notify(&self, record: &SessionRecord) {
        if let Some(sender) = self.senders.get(&record.id) {
            let _ = sender.send(record.clone());
        }
    }
}

/// In-memory record store with true compare-and-swap.
///
/// `set_unavailable(true)` makes every read and write fail, for exercising
/// the store-failure paths.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<SessionId, SessionRecord>,
    feeds: Feeds,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.check_available()?;
        match self.records.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                self.feeds.notify(&record);
                Ok(())
            }
        }
    }

    async fn read(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
        self.check_available()?;
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn write_if_version(
        &self,
        id: &SessionId,
        expected: u64,
        record: SessionRecord,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        {
            // The shard lock makes compare and swap one step.
            let mut held = self.records.get_mut(id).ok_or(StoreError::NotFound)?;
            if held.version != expected {
                return Err(StoreError::VersionConflict {
                    actual: held.version,
                });
            }
            *held = record.clone();
        }
        debug!(session = %id, version = record.version, "record written");
        self.feeds.notify(&record);
        Ok(())
    }

    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord> {
        self.feeds.subscribe(id)
    }
}

/// A store that can only overwrite (last write wins).
#[async_trait]
pub trait OverwriteStore: Send + Sync {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    async fn put(&self, record: SessionRecord) -> Result<(), StoreError>;

    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord>;
}

/// Versioned writes on top of a last-write-wins store.
///
/// Read-compare-write happens under a local lock, and the highest version
/// this adapter wrote is remembered so a read that comes back older than
/// our own write is treated as a conflict. Two processes writing through
/// separate adapters can still race between the read and the put; run a
/// single writer per session.
pub struct SingleWriterStore<S> {
    inner: S,
    write_lock: Mutex<()>,
    written: DashMap<SessionId, u64>,
}

impl<S: OverwriteStore> SingleWriterStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            write_lock: Mutex::new(()),
            written: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: OverwriteStore> RecordStore for SingleWriterStore<S> {
    async fn create(&self, record: SessionRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.inner.get(&record.id).await?.is_some() {
            return Err(StoreError::AlreadyExists);
        }
        let (id, version) = (record.id.clone(), record.version);
        self.inner.put(record).await?;
        self.written.insert(id, version);
        Ok(())
    }

    async fn read(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
        self.inner.get(id).await?.ok_or(StoreError::NotFound)
    }

    async fn write_if_version(
        &self,
        id: &SessionId,
        expected: u64,
        record: SessionRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let held = self.inner.get(id).await?.ok_or(StoreError::NotFound)?;
        let ours = self.written.get(id).map(|v| *v);

        if let Some(ours) = ours {
            if held.version < ours {
                warn!(session = %id, held = held.version, ours, "store behind our last write");
                return Err(StoreError::VersionConflict { actual: ours });
            }
        }
        if held.version != expected {
            return Err(StoreError::VersionConflict {
                actual: held.version,
            });
        }

        let version = record.version;
        self.inner.put(record).await?;
        self.written.insert(id.clone(), version);
        Ok(())
    }

    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord> {
        self.inner.subscribe(id)
    }
}

/// In-memory last-write-wins store.
#[derive(Default)]
pub struct MemoryOverwriteStore {
    records: DashMap<SessionId, SessionRecord>,
    feeds: Feeds,
}

impl MemoryOverwriteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OverwriteStore for MemoryOverwriteStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn put(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.records.insert(record.id.clone(), record.clone());
        self.feeds.notify(&record);
        Ok(())
    }

    fn subscribe(&self, id: &SessionId) -> broadcast::Receiver<SessionRecord> {
        self.feeds.subscribe(id)
    }
}
