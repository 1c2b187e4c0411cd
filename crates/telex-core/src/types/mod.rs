//! The inbound update model.
//!
//! # Hierarchy
//!
//! ```text
//! Update { update_id }
//! ├── message / edited_message / channel_post / edited_channel_post → Message
//! ├── callback_query        → CallbackQuery
//! ├── inline_query          → InlineQuery
//! ├── chosen_inline_result  → ChosenInlineResult
//! └── chat_join_request     → ChatJoinRequest
//! ```
//!
//! Every type is `Clone` (deep) and round-trips through the platform's JSON.
//! Unknown fields are ignored so newer API versions keep decoding.

mod message;
mod query;
mod update;

pub use message::{Chat, ChatType, Message, MessageEntity, User};
pub use query::{CallbackQuery, ChatJoinRequest, ChosenInlineResult, InlineQuery};
pub use update::{Update, UpdateKind};
