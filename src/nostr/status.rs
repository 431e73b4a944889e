//! Per-relay connectivity state shared between the broadcaster, the startup
//! probe and the health endpoint.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::nostr::client::RelayClient;

/// Last known connectivity of one relay. Each update replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatus {
    pub connected: bool,
    pub last_error: Option<String>,
}

/// One relay in a status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatusEntry {
    pub url: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Concurrent map of relay URL to [`RelayStatus`].
///
/// Updates lock only the shard holding that URL, so writers for different
/// relays never wait on each other. Writes to the same URL are last-write-wins.
#[derive(Clone)]
pub struct RelayStatusTracker {
    urls: Arc<Vec<String>>,
    statuses: Arc<DashMap<String, RelayStatus>>,
}

impl RelayStatusTracker {
    /// Track `urls`, all starting out disconnected with no error.
    pub fn new(urls: Vec<String>) -> Self {
        let statuses = DashMap::with_capacity(urls.len());
        for url in &urls {
            statuses.insert(url.clone(), RelayStatus::default());
        }

        Self {
            urls: Arc::new(urls),
            statuses: Arc::new(statuses),
        }
    }

    /// Configured relay URLs in configuration order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn mark_connected(&self, url: &str) {
        self.set(
            url,
            RelayStatus {
                connected: true,
                last_error: None,
            },
        );
    }

    pub fn mark_disconnected(&self, url: &str, error: impl Into<String>) {
        self.set(
            url,
            RelayStatus {
                connected: false,
                last_error: Some(error.into()),
            },
        );
    }

    fn set(&self, url: &str, status: RelayStatus) {
        self.statuses.insert(url.to_string(), status);
    }

    pub fn get(&self, url: &str) -> Option<RelayStatus> {
        self.statuses.get(url).map(|status| status.value().clone())
    }

    /// Status of every configured relay, in configuration order.
    pub fn list(&self) -> Vec<RelayStatusEntry> {
        self.urls
            .iter()
            .map(|url| {
                let status = self.get(url).unwrap_or_default();
                RelayStatusEntry {
                    url: url.clone(),
                    connected: status.connected,
                    error: status.last_error,
                }
            })
            .collect()
    }

    /// Try to connect to each of `urls` concurrently, record the outcome and
    /// release the connection again. One relay failing never affects another.
    pub async fn probe(&self, client: &dyn RelayClient, urls: &[String]) {
        join_all(urls.iter().map(|url| self.probe_one(client, url))).await;
    }

    /// [`probe`](Self::probe) every configured relay.
    pub async fn probe_all(&self, client: &dyn RelayClient) {
        let urls = self.urls.clone();
        self.probe(client, &urls).await;
    }

    async fn probe_one(&self, client: &dyn RelayClient, url: &str) {
        match client.ensure_connection(url).await {
            Ok(()) => {
                debug!("Relay reachable: {}", url);
                self.mark_connected(url);
                client.release(url).await;
            }
            Err(e) => {
                warn!("Relay unreachable {}: {}", url, e);
                self.mark_disconnected(url, e.to_string());
            }
        }
    }
}
