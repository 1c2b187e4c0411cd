//! Unified error types for the Telex core.
//!
//! Framework-level errors (like `HandlerError`) are defined in telex-framework.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised while moving bytes to or from the Bot API.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status and no API envelope.
    #[error("HTTP {status} error: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for Bot API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The API answered with `ok: false`.
    #[error("API error ({code}): {description}")]
    Api {
        /// The platform's error code (usually mirrors the HTTP status).
        code: i64,
        /// Human-readable description from the platform.
        description: String,
        /// Seconds to wait before retrying, when the request was throttled.
        retry_after: Option<u64>,
    },

    /// The transport failed before an API answer was available.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failed to serialize parameters or deserialize a result.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The bot token does not have the `<id>:<secret>` shape.
    #[error("invalid bot token")]
    InvalidToken,
}

impl ApiError {
    /// Returns the server-requested back-off, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
