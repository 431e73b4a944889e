use serde::Serialize;

use crate::error::{GatewayError, Result};
use crate::nostr::event::Event;

/// Result of a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Stored,
    /// An event with the same id was already present; nothing was written.
    AlreadyExists,
}

/// Row of the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: i64,
    pub tags: String,
    pub content: String,
    pub sig: String,
}

impl StoredEvent {
    /// Convert back to the public wire shape.
    pub fn into_event(self) -> Result<Event> {
        let kind = u32::try_from(self.kind).map_err(|_| {
            GatewayError::Database(format!("Stored event {} has invalid kind {}", self.id, self.kind))
        })?;
        let tags = serde_json::from_str(&self.tags)?;

        Ok(Event {
            id: self.id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind,
            tags,
            content: self.content,
            sig: self.sig,
        })
    }
}
