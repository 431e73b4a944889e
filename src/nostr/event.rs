//! Nostr event model.
//!
//! [`Event`] is the identity-complete, signed form that is broadcast and
//! persisted. [`EventDraft`] is the same shape with the identity fields still
//! optional, as produced by the builder or received from a caller.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayError, Result};

/// A tag entry: the first element is the tag name, the rest is data.
pub type Tag = Vec<String>;

/// Kind of a plain text note.
pub const TEXT_NOTE: u32 = 1;

/// Signed event in its public wire shape.
///
/// ```json
/// {
///   "id": "4376c65d...",
///   "pubkey": "6e468422...",
///   "created_at": 1700000000,
///   "kind": 1,
///   "tags": [["e", "5c83da77..."], ["t", "news"]],
///   "content": "hello",
///   "sig": "908a15e4..."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Hex sha256 over the serialized identity fields.
    pub id: String,
    /// Hex x-only public key of the author.
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u32,
    pub tags: Vec<Tag>,
    pub content: String,
    /// Hex Schnorr signature over `id`.
    pub sig: String,
}

impl Event {
    /// Distinct event ids referenced by `e` tags, in first-seen order.
    pub fn referenced_events(&self) -> Vec<String> {
        collect_references(&self.tags, "e")
    }

    /// Distinct public keys referenced by `p` tags, in first-seen order.
    pub fn referenced_pubkeys(&self) -> Vec<String> {
        collect_references(&self.tags, "p")
    }
}

fn collect_references(tags: &[Tag], name: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();
    for tag in tags {
        if tag.first().map(String::as_str) != Some(name) {
            continue;
        }
        match tag.get(1) {
            Some(value) if !value.is_empty() && seen.insert(value.clone()) => {
                references.push(value.clone());
            }
            _ => {}
        }
    }
    references
}

/// An event that may still be missing its identity fields.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub kind: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl EventDraft {
    pub fn new(kind: u32, content: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            kind,
            content: content.into(),
            tags,
            ..Default::default()
        }
    }

    /// Parse a loosely typed JSON value, checking that `kind` is numeric and
    /// `content` is a string.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| GatewayError::InvalidEvent("event must be an object".to_string()))?;

        let kind = object
            .get("kind")
            .and_then(Value::as_u64)
            .and_then(|kind| u32::try_from(kind).ok())
            .ok_or_else(|| GatewayError::invalid_field("kind", "number"))?;

        let content = object
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid_field("content", "string"))?
            .to_string();

        let tags = match object.get("tags") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(string_array)
                .collect::<Option<Vec<Tag>>>()
                .ok_or_else(|| GatewayError::invalid_field("tags", "list of string lists"))?,
            Some(_) => return Err(GatewayError::invalid_field("tags", "list of string lists")),
        };

        let created_at = match object.get("created_at") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .as_i64()
                    .ok_or_else(|| GatewayError::invalid_field("created_at", "number"))?,
            ),
        };

        Ok(Self {
            id: optional_string(object.get("id"), "id")?,
            pubkey: optional_string(object.get("pubkey"), "pubkey")?,
            created_at,
            kind,
            tags,
            content,
            sig: optional_string(object.get("sig"), "sig")?,
        })
    }
}

impl From<Event> for EventDraft {
    fn from(event: Event) -> Self {
        Self {
            id: Some(event.id),
            pubkey: Some(event.pubkey),
            created_at: Some(event.created_at),
            kind: event.kind,
            tags: event.tags,
            content: event.content,
            sig: Some(event.sig),
        }
    }
}

fn string_array(value: &Value) -> Option<Tag> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn optional_string(value: Option<&Value>, field: &str) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GatewayError::invalid_field(field, "string")),
    }
}
