//! Signing primitives for Nostr events.

pub mod signer;

pub use signer::{SchnorrSigner, Signer, SigningIdentity};
