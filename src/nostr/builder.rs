//! Assembly of unsigned drafts and identity-complete events.

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use regex::Regex;
use secp256k1::SecretKey;
use serde_json::Value;

use crate::crypto::{Signer, SigningIdentity};
use crate::error::{GatewayError, Result};
use crate::nostr::event::{Event, EventDraft, TEXT_NOTE};
use crate::nostr::tags::TagProcessor;

static HEX_32: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").unwrap());
static HEX_64: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{128}$").unwrap());

/// Builds text notes for the configured signing identity.
#[derive(Clone)]
pub struct EventBuilder {
    identity: SigningIdentity,
    signer: Arc<dyn Signer>,
}

impl EventBuilder {
    pub fn new(identity: SigningIdentity, signer: Arc<dyn Signer>) -> Self {
        Self { identity, signer }
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Unsigned kind 1 note stamped with the current time.
    pub fn build(&self, content: &str, raw_tags: &Value) -> EventDraft {
        self.build_at(content, raw_tags, Utc::now().timestamp())
    }

    /// Unsigned kind 1 note with an explicit `created_at`.
    pub fn build_at(&self, content: &str, raw_tags: &Value, created_at: i64) -> EventDraft {
        EventDraft {
            pubkey: Some(self.identity.public_key().to_string()),
            created_at: Some(created_at),
            ..EventDraft::new(TEXT_NOTE, content, TagProcessor::process(raw_tags))
        }
    }

    /// Complete `draft` with this builder's identity. See [`prepare`].
    pub fn prepare(&self, draft: EventDraft) -> Result<Event> {
        prepare(draft, self.signer.as_ref(), self.identity.secret_key())
    }

    /// Parse a loosely typed event and complete it. See [`prepare`].
    pub fn prepare_value(&self, value: &Value) -> Result<Event> {
        self.prepare(EventDraft::from_value(value)?)
    }
}

/// Fill in whatever identity fields `draft` is missing.
///
/// `pubkey` is derived from `secret_key`, `created_at` defaults to now (a
/// zero timestamp counts as unset), `id`
/// is the hash of the remaining fields and `sig` signs that id. Supplied
/// fields are kept as-is, so preparing a complete event returns it unchanged.
pub fn prepare(draft: EventDraft, signer: &dyn Signer, secret_key: &SecretKey) -> Result<Event> {
    check_hex(draft.pubkey.as_deref(), &HEX_32, "pubkey")?;
    check_hex(draft.id.as_deref(), &HEX_32, "id")?;
    check_hex(draft.sig.as_deref(), &HEX_64, "sig")?;

    let mut draft = draft;
    if draft.pubkey.is_none() {
        draft.pubkey = Some(signer.derive_public_key(secret_key));
    }
    if matches!(draft.created_at, None | Some(0)) {
        draft.created_at = Some(Utc::now().timestamp());
    }

    let id = match draft.id.take() {
        Some(id) => id,
        None => signer.hash(&draft)?,
    };
    let sig = match draft.sig.take() {
        Some(sig) => sig,
        None => signer.sign(&id, secret_key)?,
    };

    let EventDraft {
        pubkey,
        created_at,
        kind,
        tags,
        content,
        ..
    } = draft;

    Ok(Event {
        id,
        pubkey: pubkey.unwrap_or_default(),
        created_at: created_at.unwrap_or_default(),
        kind,
        tags,
        content,
        sig,
    })
}

fn check_hex(value: Option<&str>, pattern: &Regex, field: &str) -> Result<()> {
    match value {
        Some(value) if !pattern.is_match(value) => Err(GatewayError::InvalidEvent(format!(
            "{} must be a hex string of the expected length",
            field
        ))),
        _ => Ok(()),
    }
}
