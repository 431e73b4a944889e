//! Nostr event construction and relay broadcasting.
//!
//! Events are built from caller content, signed with the gateway's identity
//! and published to every configured relay concurrently.

pub mod broadcaster;
pub mod builder;
pub mod client;
pub mod event;
pub mod status;
pub mod tags;

pub use broadcaster::{BroadcastResult, EventBroadcaster, RelayPublishResult};
pub use builder::EventBuilder;
pub use client::{PoolRelayClient, RelayClient, RelayError};
pub use event::{Event, EventDraft, Tag};
pub use status::{RelayStatus, RelayStatusEntry, RelayStatusTracker};
pub use tags::TagProcessor;
