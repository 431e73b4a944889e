//! Tag canonicalization for caller-supplied tag lists.
//!
//! Processing is best-effort: a malformed entry is dropped with a warning and
//! the remaining entries are still processed.

use std::sync::LazyLock;

use nostr_sdk::PublicKey;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::nostr::event::Tag;

static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]+$").unwrap());

pub struct TagProcessor;

impl TagProcessor {
    /// Canonicalize a raw, loosely typed tag list.
    ///
    /// Anything other than a JSON array yields an empty list.
    pub fn process(raw: &Value) -> Vec<Tag> {
        let Some(entries) = raw.as_array() else {
            return Vec::new();
        };

        entries.iter().filter_map(Self::process_entry).collect()
    }

    fn process_entry(entry: &Value) -> Option<Tag> {
        let items = entry.as_array().filter(|items| !items.is_empty())?;
        let cleaned: Vec<String> = items.iter().map(coerce).collect();

        let name = cleaned[0].to_lowercase();
        if name.is_empty() {
            return None;
        }

        match name.as_str() {
            "e" => Self::reference_tag("e", &cleaned, Some),
            "p" => Self::reference_tag("p", &cleaned, normalize_pubkey),
            _ => Some(cleaned),
        }
    }

    /// Build `[name, id, relay?, extra?]` for an `e` or `p` tag, dropping the
    /// tag when the identifier is missing or not hex.
    fn reference_tag(
        name: &str,
        cleaned: &[String],
        normalize: impl Fn(String) -> Option<String>,
    ) -> Option<Tag> {
        let Some(raw_id) = cleaned.get(1) else {
            warn!("Skipping {} tag without identifier: {:?}", name, cleaned);
            return None;
        };

        let id = match normalize(raw_id.clone()) {
            Some(id) if HEX.is_match(&id) => id,
            _ => {
                warn!("Skipping invalid {} tag (not hex): {:?}", name, cleaned);
                return None;
            }
        };

        let mut tag = vec![name.to_string(), id];
        tag.extend(cleaned.iter().skip(2).take(2).cloned());
        while tag.len() > 2 && tag.last().is_some_and(String::is_empty) {
            tag.pop();
        }
        Some(tag)
    }
}

/// Decode `npub1` identifiers to hex; anything else passes through.
fn normalize_pubkey(value: String) -> Option<String> {
    if !value.starts_with("npub1") {
        return Some(value);
    }
    match PublicKey::parse(&value) {
        Ok(public_key) => Some(public_key.to_hex()),
        Err(e) => {
            warn!("Failed to decode {}: {}", value, e);
            None
        }
    }
}

fn coerce(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
