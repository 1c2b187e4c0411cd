//! Shared fixtures for the unit tests of this crate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use telex_core::{ApiError, ApiResult, BotApi, BoxedBot, Chat, Message, Update};
use tokio_util::sync::CancellationToken;

use crate::context::Context;

/// A bot that refuses every call.
pub struct NoopBot;

#[async_trait]
impl BotApi for NoopBot {
    async fn call(&self, method: &str, _params: Value) -> ApiResult<Value> {
        Err(ApiError::Serialization(format!("{method} is not available in tests")))
    }
}

pub fn noop_bot() -> BoxedBot {
    Arc::new(NoopBot)
}

pub fn context() -> Context {
    Context::new(noop_bot(), 0, CancellationToken::new())
}

/// A private-chat message update with the given text.
pub fn text_update(update_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            chat: Chat {
                id: 100,
                ..Default::default()
            },
            text: Some(text.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
