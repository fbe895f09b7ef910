//! Custom error types for gateway operations

use thiserror::Error;

/// Gateway-related errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Caller required an identity but none was resolvable
    #[error("Not authenticated")]
    Unauthenticated,

    /// Daily free-plan allowance exhausted
    #[error("Free plan limit reached: {used}/{limit} used today")]
    LimitExceeded {
        limit: u32,
        used: u32,
    },

    /// Request rejected before any quota/cache/AI interaction
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    /// The AI provider failed at the transport/HTTP level
    #[error("Upstream error: {status} - {detail}")]
    UpstreamUnavailable {
        status: u16,
        detail: String,
    },

    /// The AI provider answered, but not in the expected structure
    #[error("Malformed upstream output: {detail}")]
    MalformedUpstreamOutput {
        detail: String,
    },

    /// Backend row store failure
    #[error("Store error: {message}")]
    StoreError {
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
