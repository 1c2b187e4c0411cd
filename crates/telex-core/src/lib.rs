//! # Telex Core
//!
//! The foundation of the Telex bot framework.
//!
//! This crate provides the pieces every other Telex crate builds on:
//!
//! - **Update model**: [`Update`] and its sub-payloads ([`Message`],
//!   [`CallbackQuery`], [`InlineQuery`], ...), decoded straight from the
//!   platform's JSON.
//! - **Bot API**: the [`BotApi`] trait, a raw `call` primitive plus a few
//!   typed bindings built on top of it, and the [`ApiResponse`] envelope.
//! - **Errors**: [`ApiError`] and [`TransportError`].
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌───────────┐
//! │ Event Source │────▶│ Dispatcher │────▶│  Handler  │──▶ BotApi::call
//! │ (poll/hook)  │     │ (framework)│────▶│  Handler  │
//! └──────────────┘     └────────────┘     └───────────┘
//! ```

pub mod api;
pub mod error;
pub mod types;

pub use api::{
    AnswerCallbackQueryParams, ApiResponse, BotApi, BoxedBot, DeleteWebhookParams,
    GetUpdatesParams, ResponseParameters, SendMessageParams, SetWebhookParams,
};
pub use error::{ApiError, ApiResult, TransportError, TransportResult};
pub use types::{
    CallbackQuery, Chat, ChatJoinRequest, ChatType, ChosenInlineResult, InlineQuery, Message,
    MessageEntity, Update, UpdateKind, User,
};
