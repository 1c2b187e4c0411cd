//! The Bot API abstraction.
//!
//! [`BotApi`] has a single required method, [`BotApi::call`], which performs
//! one raw method call and returns the unwrapped `result` value. The typed
//! bindings are provided methods layered on top, so an implementation only
//! has to move JSON.
//!
//! ```text
//! send_message(params) ──serialize──▶ call("sendMessage", Value)
//!                                          │
//!                         ApiResponse ◀────┘  (transport-specific)
//!                              │
//!                     into_result ──deserialize──▶ Message
//! ```

mod params;
mod response;

pub use params::{
    AnswerCallbackQueryParams, DeleteWebhookParams, GetUpdatesParams, SendMessageParams,
    SetWebhookParams,
};
pub use response::{ApiResponse, ResponseParameters};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::ApiResult;
use crate::types::{Message, Update, User};

/// A shared, type-erased bot handle.
pub type BoxedBot = Arc<dyn BotApi>;

/// A client of the Bot API.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Calls `method` with a JSON object of parameters and returns the
    /// `result` field of a successful response.
    async fn call(&self, method: &str, params: Value) -> ApiResult<Value>;

    /// `getMe`: basic information about the bot.
    async fn get_me(&self) -> ApiResult<User> {
        call_typed(self, "getMe", &serde_json::json!({})).await
    }

    /// `getUpdates`: fetches pending updates.
    async fn get_updates(&self, params: &GetUpdatesParams) -> ApiResult<Vec<Update>> {
        call_typed(self, "getUpdates", params).await
    }

    /// `setWebhook`: switches the bot to webhook delivery.
    async fn set_webhook(&self, params: &SetWebhookParams) -> ApiResult<bool> {
        call_typed(self, "setWebhook", params).await
    }

    /// `deleteWebhook`: switches the bot back to polling.
    async fn delete_webhook(&self, params: &DeleteWebhookParams) -> ApiResult<bool> {
        call_typed(self, "deleteWebhook", params).await
    }

    /// `sendMessage`.
    async fn send_message(&self, params: &SendMessageParams) -> ApiResult<Message> {
        call_typed(self, "sendMessage", params).await
    }

    /// `answerCallbackQuery`.
    async fn answer_callback_query(&self, params: &AnswerCallbackQueryParams) -> ApiResult<bool> {
        call_typed(self, "answerCallbackQuery", params).await
    }
}

/// Serializes `params`, performs the call and deserializes the result.
pub async fn call_typed<B, P, R>(bot: &B, method: &str, params: &P) -> ApiResult<R>
where
    B: BotApi + ?Sized,
    P: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let params = serde_json::to_value(params)?;
    trace!(method, "calling Bot API");
    let result = bot.call(method, params).await?;
    Ok(serde_json::from_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records calls and replays a fixed answer.
    struct MockBot {
        calls: Mutex<Vec<(String, Value)>>,
        answer: ApiResult<Value>,
    }

    impl MockBot {
        fn answering(answer: ApiResult<Value>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                answer,
            }
        }
    }

    #[async_trait]
    impl BotApi for MockBot {
        async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
            self.calls.lock().push((method.to_string(), params));
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn test_send_message_serializes_params() {
        let bot = MockBot::answering(Ok(json!({
            "message_id": 10,
            "chat": {"id": 5, "type": "private"},
            "date": 0,
            "text": "hello"
        })));

        let msg = bot
            .send_message(&SendMessageParams::new(5, "hello").reply_to(3))
            .await
            .unwrap();

        assert_eq!(msg.message_id, 10);
        let calls = bot.calls.lock();
        assert_eq!(calls[0].0, "sendMessage");
        assert_eq!(
            calls[0].1,
            json!({"chat_id": 5, "text": "hello", "reply_to_message_id": 3})
        );
    }

    #[tokio::test]
    async fn test_get_updates_decodes_list() {
        let bot = MockBot::answering(Ok(json!([
            {"update_id": 1},
            {"update_id": 2, "inline_query": {"id": "q", "from": {"id": 1, "first_name": "A"}, "query": "x"}}
        ])));

        let params = GetUpdatesParams {
            offset: Some(1),
            timeout: Some(30),
            ..Default::default()
        };
        let updates = bot.get_updates(&params).await.unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].inline_query.as_ref().unwrap().query, "x");
        assert_eq!(bot.calls.lock()[0].1, json!({"offset": 1, "timeout": 30}));
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let bot = MockBot::answering(Err(ApiError::Api {
            code: 400,
            description: "Bad Request: chat not found".into(),
            retry_after: None,
        }));

        let err = bot.get_me().await.unwrap_err();
        assert!(matches!(err, ApiError::Api { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_unexpected_result_shape() {
        let bot = MockBot::answering(Ok(json!("not a user")));
        assert!(matches!(
            bot.get_me().await,
            Err(ApiError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_boxed_bot_is_object_safe() {
        let bot: BoxedBot = Arc::new(MockBot::answering(Ok(json!(true))));
        assert!(
            bot.delete_webhook(&DeleteWebhookParams::default())
                .await
                .unwrap()
        );
    }
}
