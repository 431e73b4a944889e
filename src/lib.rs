pub mod api;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod nostr;

pub use error::GatewayError;
