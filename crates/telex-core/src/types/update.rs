//! The [`Update`] envelope and its kind classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::query::{CallbackQuery, ChatJoinRequest, ChosenInlineResult, InlineQuery};

/// Classification of an update by its populated payload.
///
/// The string forms match the field names the platform uses, which are also
/// the values accepted in `allowed_updates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ChatJoinRequest,
    /// No known payload is populated.
    Unknown,
}

impl UpdateKind {
    /// Returns the platform field name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ChatJoinRequest => "chat_join_request",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "message" => Self::Message,
            "edited_message" => Self::EditedMessage,
            "channel_post" => Self::ChannelPost,
            "edited_channel_post" => Self::EditedChannelPost,
            "inline_query" => Self::InlineQuery,
            "chosen_inline_result" => Self::ChosenInlineResult,
            "callback_query" => Self::CallbackQuery,
            "chat_join_request" => Self::ChatJoinRequest,
            _ => Self::Unknown,
        })
    }
}

/// One inbound update.
///
/// At most one optional payload is populated in practice, but nothing here
/// enforces it; [`Update::kind`] reports the first populated one in field
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Monotonically increasing identifier, used as the polling cursor.
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<InlineQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<ChosenInlineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_join_request: Option<ChatJoinRequest>,
}

impl Update {
    /// Returns the kind of the first populated payload.
    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.edited_message.is_some() {
            UpdateKind::EditedMessage
        } else if self.channel_post.is_some() {
            UpdateKind::ChannelPost
        } else if self.edited_channel_post.is_some() {
            UpdateKind::EditedChannelPost
        } else if self.inline_query.is_some() {
            UpdateKind::InlineQuery
        } else if self.chosen_inline_result.is_some() {
            UpdateKind::ChosenInlineResult
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else if self.chat_join_request.is_some() {
            UpdateKind::ChatJoinRequest
        } else {
            UpdateKind::Unknown
        }
    }

    /// Returns whichever message-shaped payload is populated: a message, an
    /// edited message, a channel post or an edited channel post.
    pub fn any_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
    }

    /// Returns the id of the chat this update concerns, when there is one.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(msg) = self.any_message() {
            return Some(msg.chat.id);
        }
        if let Some(query) = &self.callback_query {
            return query.message.as_ref().map(|m| m.chat.id);
        }
        self.chat_join_request.as_ref().map(|r| r.chat.id)
    }

    /// Returns the id of the user who caused this update, when known.
    pub fn sender_id(&self) -> Option<i64> {
        if let Some(msg) = self.any_message() {
            return msg.sender_id();
        }
        self.callback_query
            .as_ref()
            .map(|q| q.from.id)
            .or(self.inline_query.as_ref().map(|q| q.from.id))
            .or(self.chosen_inline_result.as_ref().map(|r| r.from.id))
            .or(self.chat_join_request.as_ref().map(|r| r.from.id))
    }
}
