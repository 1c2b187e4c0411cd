//! Error types for the Telex transports.

use thiserror::Error;

/// Errors raised by the webhook intake.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request body is not a valid update.
    #[error("failed to decode update: {0}")]
    Decode(String),

    /// The dispatcher side of the update channel is gone.
    #[error("update channel closed")]
    ChannelClosed,

    /// The secret-token header is missing or wrong.
    #[error("missing or invalid secret token")]
    Unauthorized,

    /// Binding or serving the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;
