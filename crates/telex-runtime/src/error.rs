//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use telex_core::ApiError;
use telex_transport::WebhookError;

/// Errors that can occur while building or running a [`TelexRuntime`](crate::TelexRuntime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A Bot API call made by the runtime itself failed, or the client
    /// could not be built.
    #[error("Bot API error: {0}")]
    Api(#[from] ApiError),

    /// The webhook server failed.
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Installing the shutdown signal handlers failed.
    #[error("Failed to listen for shutdown signals: {0}")]
    Signal(std::io::Error),

    /// The Event Source task panicked.
    #[error("Event source task failed: {0}")]
    SourceTask(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
