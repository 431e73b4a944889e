//! Relay connectivity and publishing.
//!
//! [`RelayClient`] is the seam between the broadcaster and the relay wire
//! protocol. [`PoolRelayClient`] implements it on top of a `nostr-sdk` client
//! that pools one connection per relay.

use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::{Client, Event as NostrEvent, JsonUtil, RelayStatus};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::nostr::event::Event;

/// Why a single relay attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The relay could not be reached.
    #[error("{0}")]
    Connection(String),

    /// The relay answered, but did not accept the event.
    #[error("{0}")]
    Rejected(String),

    #[error("Publish timeout")]
    Timeout,
}

impl RelayError {
    /// Rejection with the relay's reason, or a generic one when it gave none.
    pub fn rejected(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.trim().is_empty() {
            Self::Rejected("Publish failed".to_string())
        } else {
            Self::Rejected(reason)
        }
    }
}

/// Connection handling and event submission for a set of relays.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Open a connection to `url`, or reuse the existing one.
    async fn ensure_connection(&self, url: &str) -> Result<(), RelayError>;

    /// Send `event` to `url` and wait for the relay's acknowledgement.
    async fn publish(&self, url: &str, event: &Event) -> Result<(), RelayError>;

    /// Drop the connection to `url`.
    async fn release(&self, url: &str);

    /// Drop every connection.
    async fn close(&self);
}

/// [`RelayClient`] backed by a pooled `nostr-sdk` client.
#[derive(Clone)]
pub struct PoolRelayClient {
    client: Client,
    connect_timeout: Duration,
}

impl PoolRelayClient {
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            client: Client::builder().build(),
            connect_timeout,
        }
    }

    fn to_nostr_event(event: &Event) -> Result<NostrEvent, RelayError> {
        let json = serde_json::to_string(event)
            .map_err(|e| RelayError::rejected(format!("Failed to serialize event: {}", e)))?;
        NostrEvent::from_json(json)
            .map_err(|e| RelayError::rejected(format!("Malformed event: {}", e)))
    }
}

#[async_trait]
impl RelayClient for PoolRelayClient {
    async fn ensure_connection(&self, url: &str) -> Result<(), RelayError> {
        let added = self
            .client
            .add_relay(url)
            .await
            .map_err(|e| RelayError::Connection(e.to_string()))?;
        if added {
            debug!("Added relay to pool: {}", url);
        }

        let relay = self
            .client
            .relay(url)
            .await
            .map_err(|e| RelayError::Connection(e.to_string()))?;

        if matches!(relay.status(), RelayStatus::Connected) {
            return Ok(());
        }

        relay
            .try_connect(self.connect_timeout)
            .await
            .map_err(|e| RelayError::Connection(e.to_string()))?;

        // try_connect returns early while another task is connecting or the
        // reconnect loop owns the relay.
        if !relay.is_connected() {
            relay.wait_for_connection(self.connect_timeout).await;
        }
        if !relay.is_connected() {
            return Err(RelayError::Connection(format!(
                "Relay not connected ({})",
                relay.status()
            )));
        }

        info!("Connected to relay: {}", url);
        Ok(())
    }

    async fn publish(&self, url: &str, event: &Event) -> Result<(), RelayError> {
        let nostr_event = Self::to_nostr_event(event)?;
        let relay = self
            .client
            .relay(url)
            .await
            .map_err(|e| RelayError::Connection(e.to_string()))?;

        relay
            .send_event(&nostr_event)
            .await
            .map(|_| ())
            .map_err(|e| RelayError::rejected(e.to_string()))
    }

    async fn release(&self, url: &str) {
        if let Err(e) = self.client.remove_relay(url).await {
            warn!("Failed to release relay {}: {}", url, e);
        }
    }

    async fn close(&self) {
        self.client.disconnect().await;
        info!("Disconnected from all Nostr relays");
    }
}
