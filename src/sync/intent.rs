//! Intents and the envelopes that carry them.
//!
//! Envelopes are bincode-encoded on the wire; every enum here is externally
//! tagged for that reason.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::Address;
use super::error::{ChannelError, Rejection};
use crate::core::action::Action;
use crate::core::ids::SessionId;
use crate::core::player::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(pub Uuid);

impl IntentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IntentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IntentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A requested mutation, tagged with the version it was formed against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub id: IntentId,
    pub session_id: SessionId,
    pub actor: PlayerId,
    pub action: Action,
    pub observed_version: u64,
    /// Where the host sends a rejection. `None` for intents applied on the
    /// host itself.
    pub reply_to: Option<Address>,
}

impl Intent {
    pub fn new(session_id: SessionId, actor: PlayerId, action: Action, observed_version: u64) -> Self {
        Self {
            id: IntentId::new(),
            session_id,
            actor,
            action,
            observed_version,
            reply_to: None,
        }
    }

    #[must_use]
    pub fn reply_to(mut self, address: Address) -> Self {
        self.reply_to = Some(address);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    /// Participant to host.
    Intent(Intent),
    /// Host to everyone.
    Applied { intent_id: IntentId, version: u64 },
    /// Host to the intent's reply address.
    Rejected(Rejection),
}

impl Envelope {
    pub fn encode(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ChannelError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
