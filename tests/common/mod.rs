#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nostr_gateway::crypto::{SchnorrSigner, SigningIdentity};
use nostr_gateway::database::EventStore;
use nostr_gateway::nostr::{
    Event, EventBroadcaster, EventBuilder, RelayClient, RelayError, RelayStatusTracker,
};
use serde_json::Value;

/// BIP-340 test vector secret key; its public key is [`TEST_PUBKEY`].
pub const TEST_SECRET_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000003";
pub const TEST_PUBKEY: &str = "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

/// How a scripted relay answers.
#[derive(Debug, Clone)]
pub enum RelayBehavior {
    Accept,
    Reject(&'static str),
    /// Never acknowledges a publish.
    Hang,
    /// Acknowledges a publish after the given delay.
    Delayed(Duration),
    /// Connecting fails with the given reason.
    Unreachable(&'static str),
}

/// In-process [`RelayClient`] with a fixed behavior per relay URL.
pub struct ScriptedRelayClient {
    behaviors: HashMap<String, RelayBehavior>,
    published: Mutex<Vec<(String, String)>>,
    acknowledged: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl ScriptedRelayClient {
    pub fn new(behaviors: &[(&str, RelayBehavior)]) -> Self {
        Self {
            behaviors: behaviors
                .iter()
                .map(|(url, behavior)| (url.to_string(), behavior.clone()))
                .collect(),
            published: Mutex::new(Vec::new()),
            acknowledged: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    /// `(relay url, event id)` for every publish attempt, in call order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    /// Relays whose publish future ran to a successful acknowledgement.
    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    fn behavior(&self, url: &str) -> Result<&RelayBehavior, RelayError> {
        self.behaviors
            .get(url)
            .ok_or_else(|| RelayError::Connection(format!("unknown relay {}", url)))
    }
}

#[async_trait]
impl RelayClient for ScriptedRelayClient {
    async fn ensure_connection(&self, url: &str) -> Result<(), RelayError> {
        match self.behavior(url)? {
            RelayBehavior::Unreachable(reason) => Err(RelayError::Connection(reason.to_string())),
            _ => Ok(()),
        }
    }

    async fn publish(&self, url: &str, event: &Event) -> Result<(), RelayError> {
        self.published
            .lock()
            .unwrap()
            .push((url.to_string(), event.id.clone()));

        match self.behavior(url)? {
            RelayBehavior::Accept => {}
            RelayBehavior::Reject(reason) => return Err(RelayError::rejected(*reason)),
            RelayBehavior::Hang => std::future::pending::<()>().await,
            RelayBehavior::Delayed(delay) => tokio::time::sleep(*delay).await,
            RelayBehavior::Unreachable(reason) => {
                return Err(RelayError::Connection(reason.to_string()))
            }
        }

        self.acknowledged.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn release(&self, url: &str) {
        self.released.lock().unwrap().push(url.to_string());
    }

    async fn close(&self) {}
}

pub fn test_builder() -> EventBuilder {
    let signer = Arc::new(SchnorrSigner::new());
    let identity = SigningIdentity::from_hex(TEST_SECRET_KEY, signer.as_ref())
        .expect("test key is valid");
    EventBuilder::new(identity, signer)
}

/// Setup an in-memory event store for testing
pub async fn setup_test_store() -> EventStore {
    EventStore::new_in_memory()
        .await
        .expect("Failed to create test database")
}

/// A signed text note with a fixed timestamp.
pub fn signed_note(content: &str, tags: Value, created_at: i64) -> Event {
    let builder = test_builder();
    builder
        .prepare(builder.build_at(content, &tags, created_at))
        .expect("note is valid")
}

/// Broadcaster over scripted relays, tracked in the order given.
pub async fn setup_broadcaster(
    relays: &[(&str, RelayBehavior)],
) -> (EventBroadcaster, Arc<ScriptedRelayClient>, EventStore) {
    let client = Arc::new(ScriptedRelayClient::new(relays));
    let tracker = RelayStatusTracker::new(relays.iter().map(|(url, _)| url.to_string()).collect());
    let store = setup_test_store().await;
    let broadcaster = EventBroadcaster::new(test_builder(), client.clone(), tracker, store.clone());
    (broadcaster, client, store)
}

/// Poll `store` until `id` shows up, since persistence runs detached.
pub async fn wait_for_event(store: &EventStore, id: &str) -> Option<Event> {
    for _ in 0..100 {
        if let Some(event) = store.get_by_id(id).await.expect("query works") {
            return Some(event);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}
