//! Concurrent fan-out of a signed event to every configured relay.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::database::models::SaveOutcome;
use crate::database::EventStore;
use crate::error::Result;
use crate::nostr::builder::EventBuilder;
use crate::nostr::client::{RelayClient, RelayError};
use crate::nostr::event::{Event, EventDraft};
use crate::nostr::status::RelayStatusTracker;

/// How long a relay gets to acknowledge a published event.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of publishing to a single relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayPublishResult {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayPublishResult {
    fn published(url: &str) -> Self {
        Self {
            url: url.to_string(),
            success: true,
            message: Some("Published successfully".to_string()),
            error: None,
        }
    }

    fn failed(url: &str, error: &RelayError) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            message: None,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate of one broadcast. Zero successful relays is still a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResult {
    pub event_id: String,
    #[serde(rename = "publishedTo")]
    pub published_count: usize,
    pub total_relays: usize,
    pub results: Vec<RelayPublishResult>,
}

#[derive(Clone)]
pub struct EventBroadcaster {
    builder: EventBuilder,
    client: Arc<dyn RelayClient>,
    tracker: RelayStatusTracker,
    store: EventStore,
    publish_timeout: Duration,
}

impl EventBroadcaster {
    pub fn new(
        builder: EventBuilder,
        client: Arc<dyn RelayClient>,
        tracker: RelayStatusTracker,
        store: EventStore,
    ) -> Self {
        Self {
            builder,
            client,
            tracker,
            store,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    pub fn builder(&self) -> &EventBuilder {
        &self.builder
    }

    pub fn tracker(&self) -> &RelayStatusTracker {
        &self.tracker
    }

    pub fn client(&self) -> &Arc<dyn RelayClient> {
        &self.client
    }

    /// Complete, persist and broadcast `draft`.
    ///
    /// Fails only when the draft cannot be turned into a valid event. Relay
    /// problems are reported per relay in the returned result, and the
    /// persistence write runs detached so its outcome never reaches the caller.
    pub async fn publish(&self, draft: EventDraft) -> Result<BroadcastResult> {
        let event = self.builder.prepare(draft)?;
        self.persist_detached(event.clone());
        Ok(self.broadcast(&event).await)
    }

    /// [`publish`](Self::publish) for a loosely typed JSON event.
    pub async fn publish_value(&self, value: &Value) -> Result<BroadcastResult> {
        self.publish(EventDraft::from_value(value)?).await
    }

    /// Send an already complete event to every relay and wait for all of them
    /// to succeed, fail or time out.
    pub async fn broadcast(&self, event: &Event) -> BroadcastResult {
        let urls = self.tracker.urls();
        let results = join_all(urls.iter().map(|url| self.publish_to_relay(url, event))).await;

        let published_count = results.iter().filter(|result| result.success).count();
        if published_count < results.len() {
            warn!(
                "Failed to publish {} to {} relays",
                event.id,
                results.len() - published_count
            );
        }
        info!("Published event {} to {}/{} relays", event.id, published_count, urls.len());

        BroadcastResult {
            event_id: event.id.clone(),
            published_count,
            total_relays: urls.len(),
            results,
        }
    }

    async fn publish_to_relay(&self, url: &str, event: &Event) -> RelayPublishResult {
        if let Err(e) = self.client.ensure_connection(url).await {
            warn!("Failed to connect to relay {}: {}", url, e);
            self.tracker.mark_disconnected(url, e.to_string());
            return RelayPublishResult::failed(url, &e);
        }
        self.tracker.mark_connected(url);

        // A timeout drops the pending publish, so a late acknowledgement is never seen.
        let publish = self.client.publish(url, event);
        let outcome = match tokio::time::timeout(self.publish_timeout, publish).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RelayError::Timeout),
        };

        match outcome {
            Ok(()) => {
                debug!("Published event {} to relay {}", event.id, url);
                self.tracker.mark_connected(url);
                RelayPublishResult::published(url)
            }
            Err(e) => {
                warn!("Failed to publish event {} to relay {}: {}", event.id, url, e);
                self.tracker.mark_disconnected(url, e.to_string());
                RelayPublishResult::failed(url, &e)
            }
        }
    }

    /// Save `event` on a background task. Failures are logged only.
    pub fn persist_detached(&self, event: Event) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            match store.save(&event).await {
                Ok(SaveOutcome::Stored) => debug!("Persisted event {}", event.id),
                Ok(SaveOutcome::AlreadyExists) => debug!("Event {} was already persisted", event.id),
                Err(e) => error!("Failed to persist event {}: {}", event.id, e),
            }
        })
    }

    pub async fn close(&self) {
        self.client.close().await;
    }
}
