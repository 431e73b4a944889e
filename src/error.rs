use thiserror::Error;

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required request field is missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An event field has the wrong type or shape.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    pub fn invalid_field(field: &str, expected: &str) -> Self {
        Self::InvalidEvent(format!("{} must be a {}", field, expected))
    }

    pub fn invalid_private_key() -> Self {
        Self::Config("NOSTR_PRIVATE_KEY must be 64 hex characters".to_string())
    }

    /// True for errors the caller caused, as opposed to server-side failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidEvent(_))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
