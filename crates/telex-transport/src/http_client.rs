//! HTTP Bot API client.
//!
//! [`HttpBot`] implements [`BotApi`] over reqwest: every call is a
//! `POST {api_url}/bot{token}/{method}` with a JSON body, answered with the
//! `{ok, result, ...}` envelope.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::debug;

use telex_core::{ApiError, ApiResponse, ApiResult, BotApi, TransportError};

/// The public Bot API server.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Length of the secret part of a bot token.
const TOKEN_SECRET_LEN: usize = 35;

/// Longest error body kept in [`TransportError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBotConfig {
    /// Base URL of the Bot API server, without a trailing slash.
    pub api_url: String,
    /// Timeout of a whole request. Must exceed the long-polling timeout.
    pub request_timeout: Duration,
}

impl Default for HttpBotConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Returns `true` if `token` has the `<digits>:<35 url-safe chars>` shape.
pub fn validate_token(token: &str) -> bool {
    let Some((id, secret)) = token.split_once(':') else {
        return false;
    };
    !id.is_empty()
        && id.bytes().all(|b| b.is_ascii_digit())
        && secret.len() == TOKEN_SECRET_LEN
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// A [`BotApi`] client speaking HTTP.
pub struct HttpBot {
    client: Client,
    token: String,
    config: HttpBotConfig,
}

impl HttpBot {
    /// Creates a client for the public Bot API server.
    pub fn new(token: impl Into<String>) -> ApiResult<Self> {
        Self::with_config(token, HttpBotConfig::default())
    }

    /// Creates a client with custom settings.
    pub fn with_config(token: impl Into<String>, config: HttpBotConfig) -> ApiResult<Self> {
        let token = token.into();
        if !validate_token(&token) {
            return Err(ApiError::InvalidToken);
        }

        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            token,
            config,
        })
    }

    /// Returns the numeric bot id, the part of the token before `:`.
    pub fn bot_id(&self) -> &str {
        self.token.split(':').next().unwrap_or_default()
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.token,
            method
        )
    }
}

#[async_trait]
impl BotApi for HttpBot {
    async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
        debug!(bot_id = %self.bot_id(), method, "Bot API request");

        // The URL carries the token, so strip it from transport errors.
        let resp = self
            .client
            .post(self.method_url(method))
            .json(&params)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        match serde_json::from_slice::<ApiResponse<Value>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY)
                    .collect(),
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }
}

impl fmt::Debug for HttpBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBot")
            .field("bot_id", &self.bot_id())
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    const TOKEN: &str = "123456:ABCdefGhIJKlmNoPQRsTUVwxyZ-0123456_";

    #[test]
    fn test_validate_token() {
        assert!(validate_token(TOKEN));
        assert!(!validate_token(""));
        assert!(!validate_token("123456"));
        assert!(!validate_token(":ABCdefGhIJKlmNoPQRsTUVwxyZ-0123456_"));
        assert!(!validate_token("12a456:ABCdefGhIJKlmNoPQRsTUVwxyZ-0123456_"));
        assert!(!validate_token("123456:short"));
        assert!(!validate_token("123456:ABCdefGhIJKlmNoPQRsTUVwxyZ-012345+_"));
    }

    #[test]
    fn test_invalid_token_rejected() {
        assert!(matches!(HttpBot::new("nope"), Err(ApiError::InvalidToken)));
    }

    #[test]
    fn test_method_url() {
        let bot = assert_ok!(HttpBot::with_config(
            TOKEN,
            HttpBotConfig {
                api_url: "http://localhost:8081/".into(),
                ..Default::default()
            },
        ));

        assert_eq!(
            bot.method_url("getMe"),
            format!("http://localhost:8081/bot{TOKEN}/getMe")
        );
        assert_eq!(bot.bot_id(), "123456");
    }

    #[test]
    fn test_debug_hides_token() {
        let bot = assert_ok!(HttpBot::new(TOKEN));
        let debug = format!("{bot:?}");
        assert!(debug.contains("123456"));
        assert!(!debug.contains("ABCdef"));
    }
}
