//! Session state held by each participant process.
//!
//! - `SessionStore`: current session + change notifications
//! - `snapshot`: export/import of the session's wire form

pub mod snapshot;
pub mod store;

pub use snapshot::SnapshotError;
pub use store::{SessionEvent, SessionStore, TurnNotice};
