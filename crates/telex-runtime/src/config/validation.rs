//! Configuration validation utilities.

use std::net::SocketAddr;

use telex_transport::{RetryConfig, validate_token};

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    BotConfig, DispatcherSettings, LongPollingSettings, TelexConfig, UpdatesConfig,
    WebhookSettings,
};

/// Longest secret token the platform accepts.
const MAX_SECRET_TOKEN_LEN: usize = 256;

/// Validates the entire configuration.
pub fn validate_config(config: &TelexConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_dispatcher_settings(&config.dispatcher)?;

    match &config.updates {
        UpdatesConfig::LongPolling(polling) => {
            validate_polling_settings(polling, config.bot.request_timeout_secs)?
        }
        UpdatesConfig::Webhook(webhook) => validate_webhook_settings(webhook)?,
    }

    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.token.is_empty() {
        return Err(ConfigError::missing_field("bot.token"));
    }
    if !validate_token(&bot.token) {
        return Err(ConfigError::validation("bot.token is not a valid bot token"));
    }

    validate_url(&bot.api_url, &["http://", "https://"])?;

    if bot.request_timeout_secs == 0 {
        return Err(ConfigError::validation(
            "bot.request_timeout_secs must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_dispatcher_settings(dispatcher: &DispatcherSettings) -> ConfigResult<()> {
    if dispatcher.buffer_size == 0 {
        return Err(ConfigError::validation(
            "dispatcher.buffer_size must be greater than 0",
        ));
    }
    if dispatcher.max_concurrency == Some(0) {
        return Err(ConfigError::validation(
            "dispatcher.max_concurrency must be greater than 0",
        ));
    }
    if dispatcher.handler_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "dispatcher.handler_timeout_ms must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_polling_settings(
    polling: &LongPollingSettings,
    request_timeout_secs: u64,
) -> ConfigResult<()> {
    if !(1..=100).contains(&polling.limit) {
        return Err(ConfigError::validation(
            "updates.limit must be between 1 and 100",
        ));
    }

    // The HTTP request has to outlive the server-side wait.
    if u64::from(polling.timeout_secs) >= request_timeout_secs {
        return Err(ConfigError::validation(format!(
            "updates.timeout_secs ({}) must be less than bot.request_timeout_secs ({})",
            polling.timeout_secs, request_timeout_secs
        )));
    }

    validate_retry_config(&polling.retry)
}

fn validate_retry_config(retry: &RetryConfig) -> ConfigResult<()> {
    if retry.initial_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Initial retry delay must be greater than 0",
        ));
    }

    if retry.max_delay_ms < retry.initial_delay_ms {
        return Err(ConfigError::validation(
            "Max retry delay must be greater than or equal to initial delay",
        ));
    }

    if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Backoff multiplier must be a finite number of at least 1.0",
        ));
    }

    Ok(())
}

fn validate_webhook_settings(webhook: &WebhookSettings) -> ConfigResult<()> {
    if webhook.listen.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::InvalidListenAddress(webhook.listen.clone()));
    }

    if !webhook.path.starts_with('/') {
        return Err(ConfigError::validation("updates.path must start with '/'"));
    }

    if let Some(url) = &webhook.public_url {
        validate_url(url, &["https://"])?;
    }

    if let Some(secret) = &webhook.secret_token {
        let well_formed = !secret.is_empty()
            && secret.len() <= MAX_SECRET_TOKEN_LEN
            && secret
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !well_formed {
            return Err(ConfigError::validation(
                "updates.secret_token must be 1-256 characters of A-Z, a-z, 0-9, _ and -",
            ));
        }
    }

    if let Some(max) = webhook.max_connections
        && !(1..=100).contains(&max)
    {
        return Err(ConfigError::validation(
            "updates.max_connections must be between 1 and 100",
        ));
    }

    Ok(())
}

fn validate_url(url: &str, schemes: &[&str]) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    if !schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {schemes:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const TOKEN: &str = "123456:ABCdefGhIJKlmNoPQRsTUVwxyZ-0123456_";

    fn valid() -> TelexConfig {
        let mut config = TelexConfig::default();
        config.bot.token = TOKEN.to_string();
        config
    }

    #[test]
    fn test_validate_defaults_with_token() {
        assert_ok!(validate_config(&valid()));
    }

    #[test]
    fn test_missing_token() {
        let result = validate_config(&TelexConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_malformed_token() {
        let mut config = valid();
        config.bot.token = "not-a-token".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_zero_buffer_size() {
        let mut config = valid();
        config.dispatcher.buffer_size = 0;
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_zero_concurrency() {
        let mut config = valid();
        config.dispatcher.max_concurrency = Some(0);
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_poll_timeout_exceeds_request_timeout() {
        let mut config = valid();
        config.bot.request_timeout_secs = 30;
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_bad_retry() {
        let mut config = valid();
        config.updates = UpdatesConfig::LongPolling(LongPollingSettings {
            retry: RetryConfig {
                initial_delay_ms: 500,
                max_delay_ms: 100,
                backoff_multiplier: 2.0,
            },
            ..Default::default()
        });
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_non_finite_backoff_multiplier() {
        let mut config = valid();
        config.updates = UpdatesConfig::LongPolling(LongPollingSettings {
            retry: RetryConfig {
                backoff_multiplier: f64::INFINITY,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_webhook_path_needs_slash() {
        let mut config = valid();
        config.updates = UpdatesConfig::Webhook(WebhookSettings {
            path: "hook".into(),
            ..Default::default()
        });
        assert_err!(validate_config(&config));
    }

    #[test]
    fn test_webhook_listen_address() {
        let mut config = valid();
        config.updates = UpdatesConfig::Webhook(WebhookSettings {
            listen: "localhost".into(),
            ..Default::default()
        });
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidListenAddress(_))
        ));
    }

    #[test]
    fn test_webhook_public_url_must_be_https() {
        let mut config = valid();
        config.updates = UpdatesConfig::Webhook(WebhookSettings {
            public_url: Some("http://example.com/webhook".into()),
            ..Default::default()
        });
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_webhook_secret_charset() {
        let mut config = valid();
        config.updates = UpdatesConfig::Webhook(WebhookSettings {
            secret_token: Some("has spaces".into()),
            ..Default::default()
        });
        assert_err!(validate_config(&config));

        config.updates = UpdatesConfig::Webhook(WebhookSettings {
            secret_token: Some("ok_secret-1".into()),
            public_url: Some("https://example.com/webhook".into()),
            ..Default::default()
        });
        assert_ok!(validate_config(&config));
    }
}
