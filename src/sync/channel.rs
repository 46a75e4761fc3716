//! Messaging between participants.
//!
//! `Transport` moves encoded envelopes; `MemoryHub` is the in-process
//! implementation, with switches to duplicate or drop deliveries so the
//! version guard can be exercised.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::error::ChannelError;
use super::intent::Envelope;
use crate::core::ids::SessionId;
use crate::core::player::PlayerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    Host,
    Participant(PlayerId),
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Host => f.write_str("host"),
            Address::Participant(id) => write!(f, "participant {id}"),
        }
    }
}

/// Receiving end for one address.
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Inbox {
    pub fn new(rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    /// Next well-formed envelope. Malformed payloads are logged and skipped.
    ///
    /// `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            let bytes = self.rx.recv().await?;
            match Envelope::decode(&bytes) {
                Ok(envelope) => return Some(envelope),
                Err(err) => warn!(error = %err, "dropping malformed envelope"),
            }
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        session: &SessionId,
        to: &Address,
        envelope: &Envelope,
    ) -> Result<(), ChannelError>;

    /// Deliver to every registered participant (not the host).
    async fn broadcast(&self, session: &SessionId, envelope: &Envelope) -> Result<(), ChannelError>;

    /// Start receiving for `address`. Registering again replaces the
    /// previous inbox.
    fn register(&self, session: &SessionId, address: Address) -> Inbox;
}

/// In-process transport.
#[derive(Default)]
pub struct MemoryHub {
    routes: DashMap<SessionId, DashMap<Address, mpsc::UnboundedSender<Vec<u8>>>>,
    duplicate: AtomicBool,
    drop_all: AtomicBool,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver every message twice.
    pub fn set_duplicate(&self, on: bool) {
        self.duplicate.store(on, Ordering::SeqCst);
    }

    /// Silently lose every message.
    pub fn set_drop(&self, on: bool) {
        self.drop_all.store(on, Ordering::SeqCst);
    }

    /// Inject raw bytes, bypassing the codec.
    pub fn send_raw(
        &self,
        session: &SessionId,
        to: &Address,
        bytes: Vec<u8>,
    ) -> Result<(), ChannelError> {
        let routes = self
            .routes
            .get(session)
            .ok_or_else(|| ChannelError::Unreachable(to.to_string()))?;
        let sender = routes
            .get(to)
            .ok_or_else(|| ChannelError::Unreachable(to.to_string()))?;
        sender.send(bytes).map_err(|_| ChannelError::Closed)
    }

    fn deliver(&self, sender: &mpsc::UnboundedSender<Vec<u8>>, bytes: &[u8]) -> Result<(), ChannelError> {
        if self.drop_all.load(Ordering::SeqCst) {
            trace!("hub dropping delivery");
            return Ok(());
        }
        let copies = if self.duplicate.load(Ordering::SeqCst) { 2 } else { 1 };
        for _ in 0..copies {
            sender.send(bytes.to_vec()).map_err(|_| ChannelError::Closed)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryHub {
    async fn send(
        &self,
        session: &SessionId,
        to: &Address,
        envelope: &Envelope,
    ) -> Result<(), ChannelError> {
        let bytes = envelope.encode()?;
        let routes = self
            .routes
            .get(session)
            .ok_or_else(|| ChannelError::Unreachable(to.to_string()))?;
        let sender = routes
            .get(to)
            .ok_or_else(|| ChannelError::Unreachable(to.to_string()))?;
        self.deliver(sender.value(), &bytes)
    }

    async fn broadcast(&self, session: &SessionId, envelope: &Envelope) -> Result<(), ChannelError> {
        let bytes = envelope.encode()?;
        let Some(routes) = self.routes.get(session) else {
            return Ok(());
        };
        for route in routes.iter() {
            if *route.key() == Address::Host {
                continue;
            }
            // One closed inbox must not starve the others.
            if let Err(err) = self.deliver(route.value(), &bytes) {
                warn!(to = %route.key(), error = %err, "broadcast delivery failed");
            }
        }
        Ok(())
    }

    fn register(&self, session: &SessionId, address: Address) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes
            .entry(session.clone())
            .or_default()
            .insert(address, tx);
        Inbox::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::intent::IntentId;

    fn applied(version: u64) -> Envelope {
        Envelope::Applied {
            intent_id: IntentId::new(),
            version,
        }
    }

    #[tokio::test]
    async fn test_send_and_broadcast() {
        let hub = MemoryHub::new();
        let session = SessionId::new("s");
        let mut host = hub.register(&session, Address::Host);
        let mut p1 = hub.register(&session, Address::Participant(PlayerId::new("p_1")));
        let mut p2 = hub.register(&session, Address::Participant(PlayerId::new("p_2")));

        let msg = applied(3);
        hub.send(&session, &Address::Host, &msg).await.unwrap();
        assert_eq!(host.recv().await, Some(msg.clone()));

        hub.broadcast(&session, &msg).await.unwrap();
        assert_eq!(p1.recv().await, Some(msg.clone()));
        assert_eq!(p2.recv().await, Some(msg));
        assert!(host.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let hub = MemoryHub::new();
        let err = hub
            .send(&SessionId::new("nowhere"), &Address::Host, &applied(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_duplicate_and_drop() {
        let hub = MemoryHub::new();
        let session = SessionId::new("s");
        let mut host = hub.register(&session, Address::Host);

        hub.set_duplicate(true);
        let msg = applied(1);
        hub.send(&session, &Address::Host, &msg).await.unwrap();
        assert_eq!(host.recv().await, Some(msg.clone()));
        assert_eq!(host.recv().await, Some(msg));

        hub.set_duplicate(false);
        hub.set_drop(true);
        hub.send(&session, &Address::Host, &applied(2)).await.unwrap();
        assert!(host.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_skipped() {
        let hub = MemoryHub::new();
        let session = SessionId::new("s");
        let mut host = hub.register(&session, Address::Host);
        hub.send_raw(&session, &Address::Host, vec![0xde, 0xad]).unwrap();
        let msg = applied(5);
        hub.send(&session, &Address::Host, &msg).await.unwrap();
        assert_eq!(host.recv().await, Some(msg));
    }
}
