use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::crypto::{Signer, SigningIdentity};
use crate::error::{GatewayError, Result};

/// Relays that are always included after the configured ones.
pub const DEFAULT_RELAYS: &[&str] = &["wss://relay.snort.social"];

/// Relays matching any of these fragments are never used.
const EXCLUDED_RELAYS: &[&str] = &["nos.lol"];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub nostr_private_key: Option<String>,
    /// Comma separated relay URLs.
    #[serde(default)]
    pub nostr_relays: Option<String>,
    /// Bind address, read from `SERVER_HOST`.
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://nostr-gateway.db".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_publish_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    /// Load from the optional config file and then the process environment,
    /// which takes precedence.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::from_sources(config_file, ::config::Environment::default())
    }

    pub fn from_sources(
        config_file: Option<&Path>,
        environment: ::config::Environment,
    ) -> Result<Self> {
        let file = match config_file {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name("gateway").required(false),
        };

        ::config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| GatewayError::Config(format!("Failed to load configuration: {}", e)))
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    /// Relays to publish to, in order, without duplicates or excluded hosts.
    pub fn relay_urls(&self) -> Vec<String> {
        let configured = self
            .nostr_relays
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim);

        let mut seen = HashSet::new();
        configured
            .chain(DEFAULT_RELAYS.iter().copied())
            .filter(|url| !url.is_empty())
            .filter(|url| !EXCLUDED_RELAYS.iter().any(|excluded| url.contains(excluded)))
            .filter(|url| seen.insert(url.to_string()))
            .map(str::to_string)
            .collect()
    }

    /// Parse the configured private key. A missing or malformed key is fatal.
    pub fn signing_identity(&self, signer: &dyn Signer) -> Result<SigningIdentity> {
        let key = self
            .nostr_private_key
            .as_deref()
            .ok_or_else(GatewayError::invalid_private_key)?;
        SigningIdentity::from_hex(key, signer)
    }
}
