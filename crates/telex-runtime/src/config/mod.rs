//! Configuration for the Telex runtime.
//!
//! Layered loading with figment ([`ConfigLoader`]), the schema
//! ([`TelexConfig`]) and its validation ([`validate_config`]).

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    BotConfig, DispatcherSettings, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    LongPollingSettings, SpanEventConfig, TelexConfig, UpdatesConfig, WebhookSettings,
};
pub use validation::validate_config;
