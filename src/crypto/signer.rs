use std::sync::LazyLock;

use regex::Regex;
use secp256k1::{schnorr, Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use sha2::{Digest, Sha256};

use crate::error::{GatewayError, Result};
use crate::nostr::event::{Event, EventDraft};

static PRIVATE_KEY_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").unwrap());

/// Key derivation, event hashing and signing.
pub trait Signer: Send + Sync {
    /// Hex x-only public key for `secret_key`.
    fn derive_public_key(&self, secret_key: &SecretKey) -> String;

    /// Hex event id over `pubkey`, `created_at`, `kind`, `tags` and `content`.
    ///
    /// `id` and `sig` on the draft are ignored.
    fn hash(&self, event: &EventDraft) -> Result<String>;

    /// Hex signature of the event id `id`.
    fn sign(&self, id: &str, secret_key: &SecretKey) -> Result<String>;
}

/// BIP-340 Schnorr signer producing Nostr (NIP-01) ids and signatures.
pub struct SchnorrSigner {
    secp: Secp256k1<secp256k1::All>,
}

impl SchnorrSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Check that `event.id` matches its content and `event.sig` is a valid
    /// signature of it by `event.pubkey`.
    pub fn verify(&self, event: &Event) -> Result<bool> {
        let expected = self.hash(&EventDraft::from(event.clone()))?;
        if expected != event.id {
            return Ok(false);
        }

        let id_bytes = decode_hex(&event.id, "event id")?;
        let message = Message::from_digest_slice(&id_bytes)
            .map_err(|e| GatewayError::Crypto(format!("Invalid event id: {}", e)))?;
        let public_key = XOnlyPublicKey::from_slice(&decode_hex(&event.pubkey, "public key")?)
            .map_err(|e| GatewayError::Crypto(format!("Invalid public key: {}", e)))?;
        let signature = schnorr::Signature::from_slice(&decode_hex(&event.sig, "signature")?)
            .map_err(|e| GatewayError::Crypto(format!("Invalid signature: {}", e)))?;

        Ok(self
            .secp
            .verify_schnorr(&signature, &message, &public_key)
            .is_ok())
    }
}

impl Default for SchnorrSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for SchnorrSigner {
    fn derive_public_key(&self, secret_key: &SecretKey) -> String {
        let keypair = Keypair::from_secret_key(&self.secp, secret_key);
        let (public_key, _parity) = keypair.x_only_public_key();
        hex::encode(public_key.serialize())
    }

    fn hash(&self, event: &EventDraft) -> Result<String> {
        let pubkey = event
            .pubkey
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidEvent("pubkey is required for hashing".into()))?;
        let created_at = event
            .created_at
            .ok_or_else(|| GatewayError::InvalidEvent("created_at is required for hashing".into()))?;

        let serialized = serde_json::to_string(&serde_json::json!([
            0,
            pubkey,
            created_at,
            event.kind,
            event.tags,
            event.content,
        ]))?;

        Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
    }

    fn sign(&self, id: &str, secret_key: &SecretKey) -> Result<String> {
        let digest = decode_hex(id, "event id")?;
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| GatewayError::Crypto(format!("Invalid message hash: {}", e)))?;
        let keypair = Keypair::from_secret_key(&self.secp, secret_key);

        Ok(self.secp.sign_schnorr_no_aux_rand(&message, &keypair).to_string())
    }
}

fn decode_hex(value: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| GatewayError::Crypto(format!("Invalid {} hex: {}", what, e)))
}

/// The process's signing key together with its derived public key.
///
/// Constructed once at startup and passed to the components that need it.
#[derive(Clone)]
pub struct SigningIdentity {
    secret_key: SecretKey,
    public_key: String,
}

impl SigningIdentity {
    /// Parse a 64 character hex secret key. Surrounding whitespace is ignored.
    pub fn from_hex(secret_hex: &str, signer: &dyn Signer) -> Result<Self> {
        let secret_hex = secret_hex.trim();
        if !PRIVATE_KEY_HEX.is_match(secret_hex) {
            return Err(GatewayError::invalid_private_key());
        }

        let bytes = decode_hex(secret_hex, "private key")?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| GatewayError::Config(format!("Invalid NOSTR_PRIVATE_KEY: {}", e)))?;

        Ok(Self::new(secret_key, signer))
    }

    pub fn new(secret_key: SecretKey, signer: &dyn Signer) -> Self {
        let public_key = signer.derive_public_key(&secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Hex x-only public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
