//! Host-authoritative replication.
//!
//! ## Protocol
//!
//! 1. A participant wraps an action in an `Intent` stamped with the version
//!    it observed.
//! 2. The intent reaches the host, locally or through a `Transport`.
//! 3. The host validates it (session, version, seat, rules) and writes the
//!    result to the `RecordStore` with compare-and-swap on `version`.
//! 4. Everyone learns the new state from the record feed, the host's
//!    `Applied` announcement, or a poll.
//!
//! Intents formed against an old version are rejected as stale, never
//! rebased, so duplicates and late deliveries cannot apply twice.

pub mod channel;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod intent;
pub mod peer;
pub mod record;

pub use channel::{Address, Inbox, MemoryHub, Transport};
pub use coordinator::{Coordinator, Role, SyncPhase};
pub use error::{ChannelError, RejectReason, Rejection, StoreError, SubmitError};
pub use host::HostCoordinator;
pub use intent::{Envelope, Intent, IntentId};
pub use peer::PeerCoordinator;
pub use record::{
    MemoryOverwriteStore, MemoryRecordStore, OverwriteStore, RecordStore, SessionRecord,
    SingleWriterStore,
};
