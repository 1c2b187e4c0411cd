//! Queries and requests that are not messages.

use serde::{Deserialize, Serialize};

use super::message::{Chat, ChatType, Message, User};

/// A press on an inline keyboard button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    /// Unique query identifier, needed to answer the query.
    pub id: String,
    /// User who pressed the button.
    pub from: User,
    /// Message carrying the keyboard, when it was sent by the bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<Message>>,
    /// Identifier of the inline message carrying the keyboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    /// Global identifier of the chat the keyboard was shown in.
    #[serde(default)]
    pub chat_instance: String,
    /// Data attached to the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// An inline query typed in `@bot ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineQuery {
    /// Unique query identifier.
    pub id: String,
    /// Sender.
    pub from: User,
    /// Text of the query.
    #[serde(default)]
    pub query: String,
    /// Pagination offset controlled by the bot.
    #[serde(default)]
    pub offset: String,
    /// Type of chat the query was sent from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<ChatType>,
}

/// An inline result the user chose and sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    /// Identifier of the chosen result.
    pub result_id: String,
    /// User who chose it.
    pub from: User,
    /// Query that produced the result.
    #[serde(default)]
    pub query: String,
    /// Identifier of the sent inline message, if it has a keyboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
}

/// A request to join a chat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    /// Chat the request was sent to.
    pub chat: Chat,
    /// User who wants to join.
    pub from: User,
    /// Unix time the request was sent.
    #[serde(default)]
    pub date: i64,
    /// Bio of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}
