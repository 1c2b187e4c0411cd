//! # Telex
//!
//! An async Telegram bot framework for Rust.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  mpsc  ┌────────────┐ resolve ┌──────────────────────────────┐
//! │ Event Source │───────▶│ Dispatcher │────────▶│ HandlerGroup                 │
//! │ poll / hook  │        │ task/update│         │  [preds] → handler           │
//! └──────────────┘        └────────────┘         │  [preds] → group { mw, .. }  │
//!                                │               └──────────────────────────────┘
//!                                ▼
//!                   mw ─ctx.next()─▶ mw ─ctx.next()─▶ handler ──▶ BotApi
//! ```
//!
//! - **Event Sources**: long polling or a webhook server feed one channel
//! - **Dispatcher**: one task and one cancellation token per update
//! - **Handler groups**: the first route whose predicates all pass wins;
//!   a group that matches nothing lets the search continue after it
//! - **Middlewares**: run in order and call [`Context::next`](framework::Context::next)
//!   to continue, or return to stop the chain
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use telex::prelude::*;
//!
//! async fn echo(ctx: Context, message: Message) -> HandlerResult {
//!     let text = message.text.unwrap_or_default();
//!     ctx.bot().send_message(&SendMessageParams::new(message.chat.id, text)).await?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = TelexRuntime::builder().build()?;
//!     runtime.handlers_mut().handle_message(echo, [any_message_with_text()]);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `telex.toml` configuration files
//! - `yaml-config`: `telex.yaml` configuration files
//! - `json-log`: JSON log lines

pub use telex_core as core;
pub use telex_framework as framework;
pub use telex_runtime as runtime;
pub use telex_transport as transport;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use telex::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use telex_runtime::{TelexConfig, TelexRuntime};

    // Dispatch core
    pub use telex_framework::{
        BoxError, Context, Dispatcher, DispatcherConfig, HandlerError, HandlerGroup,
        HandlerResult, Predicate,
    };

    // Predicates and middlewares
    pub use telex_framework::middleware;
    pub use telex_framework::predicates::*;

    // Update model and Bot API
    pub use telex_core::{
        AnswerCallbackQueryParams, BotApi, BoxedBot, CallbackQuery, Chat, ChatType, Message,
        SendMessageParams, Update, User,
    };
}
