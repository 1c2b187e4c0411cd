//! # Telex Transport
//!
//! Event Sources and the HTTP Bot API client for the Telex bot framework.
//!
//! Everything here feeds, or is fed by, the dispatcher's update channel:
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │  LongPolling     │   │  webhook_router  │   Event Sources
//! │  (getUpdates)    │   │  (axum, POST)    │
//! └────────┬─────────┘   └────────┬─────────┘
//!          └──────── mpsc<Update> ┘
//!                        │
//!                        ▼
//!                 telex-framework Dispatcher ──▶ handlers ──▶ HttpBot
//! ```
//!
//! ## Features
//!
//! - `http-client`: [`HttpBot`], a reqwest-backed [`BotApi`](telex_core::BotApi)
//! - `webhook`: an axum router and server for webhook delivery
//! - `full`: both
//!
//! Long polling is always available; it only needs a `BotApi`.

pub mod error;
pub mod long_polling;
pub mod retry;

#[cfg(feature = "http-client")]
pub mod http_client;

#[cfg(feature = "webhook")]
pub mod webhook;

pub use error::{WebhookError, WebhookResult};
pub use long_polling::{LongPolling, LongPollingConfig};
pub use retry::RetryConfig;

#[cfg(feature = "http-client")]
pub use http_client::{DEFAULT_API_URL, HttpBot, HttpBotConfig, validate_token};

#[cfg(feature = "webhook")]
pub use webhook::{SECRET_TOKEN_HEADER, decode_update, serve, webhook_router};
