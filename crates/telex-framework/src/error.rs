//! Error types for the Telex framework.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Error type handlers return. Any `std::error::Error` converts into it with `?`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a handler or middleware.
pub type HandlerResult = Result<(), BoxError>;

/// Failures the dispatch machinery itself produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// A handler panicked and the panic was caught.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// The rest of the chain did not finish in time.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    /// The event's cancellation token fired before the next link could start.
    #[error("dispatch cancelled")]
    Cancelled,
}

impl HandlerError {
    /// Returns `true` if `err` is a [`HandlerError::Cancelled`].
    pub fn is_cancelled(err: &BoxError) -> bool {
        matches!(err.downcast_ref::<Self>(), Some(Self::Cancelled))
    }

    /// Builds a [`HandlerError::Panic`] from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panic(message)
    }
}
