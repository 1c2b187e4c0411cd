//! Configuration schema definitions.
//!
//! ```toml
//! [bot]
//! token = "123456:ABC..."
//!
//! [updates]
//! mode = "long-polling"
//! timeout_secs = 30
//!
//! [dispatcher]
//! max_concurrency = 64
//! handler_timeout_ms = 10000
//!
//! [logging]
//! level = "debug"
//! filters = { telex_transport = "info" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use telex_framework::DispatcherConfig;
use telex_transport::{DEFAULT_API_URL, HttpBotConfig, LongPollingConfig, RetryConfig};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelexConfig {
    #[serde(default)]
    pub bot: BotConfig,

    /// Where updates come from.
    #[serde(default)]
    pub updates: UpdatesConfig,

    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot API client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token. Usually supplied through `TELEX_BOT__TOKEN`.
    pub token: String,

    /// Base URL of the Bot API server.
    pub api_url: String,

    /// Timeout of a single API request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl BotConfig {
    pub fn to_http_config(&self) -> HttpBotConfig {
        HttpBotConfig {
            api_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

// =============================================================================
// Event Sources
// =============================================================================

/// Event Source selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum UpdatesConfig {
    /// Pull updates with `getUpdates`.
    LongPolling(LongPollingSettings),

    /// Receive updates as HTTP `POST`s.
    Webhook(WebhookSettings),
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self::LongPolling(LongPollingSettings::default())
    }
}

impl UpdatesConfig {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::LongPolling(_) => "long-polling",
            Self::Webhook(_) => "webhook",
        }
    }
}

/// Long-polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongPollingSettings {
    /// Server-side wait per poll, in seconds.
    pub timeout_secs: u32,

    /// Maximum updates per poll, 1-100.
    pub limit: u32,

    /// Pause between polls, in milliseconds.
    pub interval_ms: u64,

    /// Update kinds to request.
    pub allowed_updates: Option<Vec<String>>,

    /// Drop updates that queued up while the bot was offline.
    pub drop_pending_updates: bool,

    pub retry: RetryConfig,
}

impl Default for LongPollingSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            limit: 100,
            interval_ms: 0,
            allowed_updates: None,
            drop_pending_updates: false,
            retry: RetryConfig::default(),
        }
    }
}

impl LongPollingSettings {
    /// Builds the transport config; the channel shares the dispatcher's
    /// buffer size.
    pub fn to_polling_config(&self, buffer_size: usize) -> LongPollingConfig {
        LongPollingConfig {
            timeout_secs: self.timeout_secs,
            limit: self.limit,
            interval: Duration::from_millis(self.interval_ms),
            allowed_updates: self.allowed_updates.clone(),
            buffer_size,
            retry: self.retry.clone(),
        }
    }
}

/// Webhook settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Local `ip:port` to bind.
    pub listen: String,

    /// Route path the platform posts to.
    pub path: String,

    /// Public HTTPS URL registered with `setWebhook`. When unset the webhook
    /// is assumed to be registered already.
    pub public_url: Option<String>,

    /// Secret echoed back in `X-Telegram-Bot-Api-Secret-Token`.
    pub secret_token: Option<String>,

    /// Maximum simultaneous connections the platform opens, 1-100.
    pub max_connections: Option<u32>,

    pub allowed_updates: Option<Vec<String>>,

    pub drop_pending_updates: bool,

    /// Call `deleteWebhook` on shutdown.
    pub delete_on_shutdown: bool,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8443".to_string(),
            path: "/webhook".to_string(),
            public_url: None,
            secret_token: None,
            max_connections: None,
            allowed_updates: None,
            drop_pending_updates: false,
            delete_on_shutdown: true,
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Dispatcher settings, in config-file units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Capacity of the update channel between Event Source and dispatcher.
    pub buffer_size: usize,

    /// Upper bound on concurrently running chains.
    pub max_concurrency: Option<usize>,

    /// Turn handler panics into errors.
    pub recover_panics: bool,

    /// Deadline for every chain, in milliseconds.
    pub handler_timeout_ms: Option<u64>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        let defaults = DispatcherConfig::default();
        Self {
            buffer_size: defaults.buffer_size,
            max_concurrency: defaults.max_concurrency,
            recover_panics: defaults.recover_panics,
            handler_timeout_ms: None,
        }
    }
}

impl DispatcherSettings {
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            buffer_size: self.buffer_size,
            max_concurrency: self.max_concurrency,
            recover_panics: self.recover_panics,
            handler_timeout: self.handler_timeout_ms.map(Duration::from_millis),
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation for [`LogOutput::File`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,

    /// Log file for [`LogOutput::File`].
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,

    /// Per-target levels, e.g. `telex_transport = "warn"`.
    pub filters: BTreeMap<String, LogLevel>,

    pub thread_ids: bool,

    /// Include file and line of each event.
    pub file_location: bool,

    pub span_events: SpanEventConfig,
}
