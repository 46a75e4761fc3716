//! Error types for replication and intent submission.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::intent::IntentId;
use crate::core::player::PlayerId;
use crate::rules::RuleViolation;
use crate::session::SnapshotError;

/// Why the host refused an intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The intent was formed against an older version.
    Stale { expected_version: u64 },
    /// The rules engine refused the action.
    IllegalMove,
    /// The actor has no seat in this session.
    NotSeated,
    SessionMissing,
    SessionFinished,
    /// The host could not persist the transition.
    StoreUnavailable,
}

impl RejectReason {
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, RejectReason::Stale { .. })
    }
}

/// A rejection as delivered to the submitting participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("intent {intent_id} from {actor} rejected ({reason:?}): {message}")]
pub struct Rejection {
    pub intent_id: IntentId,
    pub actor: PlayerId,
    pub reason: RejectReason,
    pub message: String,
}

impl Rejection {
    pub fn new(
        intent_id: IntentId,
        actor: PlayerId,
        reason: RejectReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            intent_id,
            actor,
            reason,
            message: message.into(),
        }
    }

    pub fn illegal(intent_id: IntentId, actor: PlayerId, violation: &RuleViolation) -> Self {
        Self::new(intent_id, actor, RejectReason::IllegalMove, violation.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("version conflict: store holds version {actual}")]
    VersionConflict { actual: u64 },
    /// The record holds a finished session, which is never replaced.
    #[error("record holds a finished session")]
    Finalized,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
    #[error("no route to {0}")]
    Unreachable(String),
    #[error("envelope codec: {0}")]
    Codec(#[from] bincode::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// No response within the submit timeout. The outcome is unknown; the
    /// participant has resynced and must decide again.
    #[error("intent {intent_id} unresolved")]
    Unresolved { intent_id: IntentId },
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("not joined to a session")]
    NotJoined,
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Session setup refused by the rules engine.
    #[error(transparent)]
    Rules(#[from] RuleViolation),
}

impl SubmitError {
    /// The rejection reason, if the host answered with one.
    #[must_use]
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            SubmitError::Rejected(rejection) => Some(&rejection.reason),
            _ => None,
        }
    }
}
