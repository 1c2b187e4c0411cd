//! # Telex Runtime
//!
//! Orchestration layer for the Telex bot framework:
//!
//! - layered configuration ([`ConfigLoader`], [`TelexConfig`])
//! - logging setup ([`LoggingBuilder`], [`logging::init_from_config`])
//! - [`TelexRuntime`], which builds the bot client, runs the configured
//!   Event Source and the dispatcher, and shuts both down on Ctrl+C/SIGTERM
//!
//! ```ignore
//! use telex_runtime::TelexRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // telex.toml + TELEX_* environment variables
//!     let mut runtime = TelexRuntime::builder().build()?;
//!     runtime.handlers_mut().handle_message(echo, []);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, TelexConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, TelexRuntime};

// Re-export tracing for use by handler crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
