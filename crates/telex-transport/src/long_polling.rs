//! Long-polling Event Source.
//!
//! Repeatedly calls `getUpdates` and forwards every update, in order, into an
//! `mpsc` channel the [`Dispatcher`](https://docs.rs/telex-framework) reads.
//!
//! ```text
//!  ┌──────────┐ getUpdates(offset) ┌─────────┐  send  ┌────────────┐
//!  │ Bot API  │◀───────────────────│  poll   │───────▶│  channel   │──▶ Dispatcher
//!  └──────────┘───── [updates] ───▶│  loop   │        └────────────┘
//!                                  └─────────┘
//!                          offset = max(update_id) + 1
//! ```
//!
//! Failed polls are retried forever with exponential backoff, or after the
//! server's `retry_after` when it sends one. The loop ends when its token is
//! cancelled or the receiver is dropped; either way the channel closes.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use telex_core::{BoxedBot, GetUpdatesParams, Update};

use crate::retry::RetryConfig;

/// Long-polling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LongPollingConfig {
    /// Server-side wait for new updates, in seconds.
    pub timeout_secs: u32,
    /// Maximum number of updates per poll, 1-100.
    pub limit: u32,
    /// Pause between successful polls.
    pub interval: Duration,
    /// Update kinds to request; `None` keeps the server's current setting.
    pub allowed_updates: Option<Vec<String>>,
    /// Capacity of the channel returned by [`LongPolling::spawn`].
    pub buffer_size: usize,
    pub retry: RetryConfig,
}

impl Default for LongPollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            limit: 100,
            interval: Duration::ZERO,
            allowed_updates: None,
            buffer_size: 100,
            retry: RetryConfig::default(),
        }
    }
}

/// The long-polling loop.
pub struct LongPolling {
    bot: BoxedBot,
    config: LongPollingConfig,
    /// Next `offset` to request. Zero until the first update arrives.
    offset: i64,
}

impl LongPolling {
    pub fn new(bot: BoxedBot, config: LongPollingConfig) -> Self {
        Self {
            bot,
            config,
            offset: 0,
        }
    }

    /// Starts from `offset` instead of the server's oldest unconfirmed update.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Spawns the loop and returns the receiving end of its channel.
    pub fn spawn(self, token: CancellationToken) -> (mpsc::Receiver<Update>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.buffer_size.max(1));
        let handle = tokio::spawn(self.run(tx, token));
        (rx, handle)
    }

    /// Runs the loop on the current task, sending into `sender`.
    pub async fn run(mut self, sender: mpsc::Sender<Update>, token: CancellationToken) {
        info!(
            timeout_secs = self.config.timeout_secs,
            limit = self.config.limit,
            "Long polling started"
        );

        let mut backoff = self.config.retry.initial_delay();

        loop {
            let params = self.params();
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = self.bot.get_updates(&params) => result,
            };

            let updates = match result {
                Ok(updates) => {
                    backoff = self.config.retry.initial_delay();
                    updates
                }
                Err(err) => {
                    let wait = match err.retry_after() {
                        Some(secs) => Duration::from_secs(secs),
                        None => {
                            let wait = backoff;
                            backoff = self.config.retry.next_delay(backoff);
                            wait
                        }
                    };
                    warn!(error = %err, retry_in = ?wait, "getUpdates failed");
                    if sleep_or_cancel(wait, &token).await {
                        break;
                    }
                    continue;
                }
            };

            if !updates.is_empty() {
                debug!(count = updates.len(), offset = self.offset, "Received updates");
            }
            for update in updates {
                self.offset = self.offset.max(update.update_id + 1);
                trace!(update_id = update.update_id, "Forwarding update");
                let sent = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    sent = sender.send(update) => sent,
                };
                if sent.is_err() {
                    info!("Update receiver dropped, long polling stopped");
                    return;
                }
            }

            if token.is_cancelled() {
                break;
            }
            if !self.config.interval.is_zero() && sleep_or_cancel(self.config.interval, &token).await {
                break;
            }
        }

        info!(offset = self.offset, "Long polling stopped");
    }

    fn params(&self) -> GetUpdatesParams {
        GetUpdatesParams {
            offset: (self.offset != 0).then_some(self.offset),
            limit: Some(self.config.limit),
            timeout: Some(self.config.timeout_secs),
            allowed_updates: self.config.allowed_updates.clone(),
        }
    }
}

/// Sleeps for `duration`. Returns `true` if the token fired first.
async fn sleep_or_cancel(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use telex_core::{ApiError, ApiResult, BotApi, TransportError};

    /// Replays scripted `getUpdates` answers, then blocks forever.
    struct ScriptedBot {
        answers: Mutex<VecDeque<ApiResult<Value>>>,
        requests: Mutex<Vec<Value>>,
    }

    impl ScriptedBot {
        fn new(answers: Vec<ApiResult<Value>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl BotApi for ScriptedBot {
        async fn call(&self, method: &str, params: Value) -> ApiResult<Value> {
            assert_eq!(method, "getUpdates");
            self.requests.lock().push(params);
            let answer = self.answers.lock().pop_front();
            match answer {
                Some(answer) => answer,
                None => std::future::pending().await,
            }
        }
    }

    fn config() -> LongPollingConfig {
        LongPollingConfig {
            timeout_secs: 10,
            limit: 50,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_forwards_updates_and_advances_offset() {
        let bot = ScriptedBot::new(vec![
            Ok(json!([{"update_id": 5}, {"update_id": 6}])),
            Err(ApiError::Api {
                code: 429,
                description: "Too Many Requests".into(),
                retry_after: Some(2),
            }),
            Err(TransportError::Request("connection reset".into()).into()),
            Ok(json!([{"update_id": 7}])),
        ]);
        let token = CancellationToken::new();
        let (mut rx, handle) = LongPolling::new(bot.clone(), config()).spawn(token.clone());

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(rx.recv().await.unwrap().update_id);
        }
        assert_eq!(ids, [5, 6, 7]);

        token.cancel();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());

        let requests = bot.requests.lock();
        assert_eq!(requests[0], json!({"limit": 50, "timeout": 10}));
        assert_eq!(requests[1]["offset"], 7);
        assert_eq!(requests[2]["offset"], 7);
        assert_eq!(requests[3]["offset"], 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let bot = ScriptedBot::new(vec![Ok(json!([{"update_id": 1}, {"update_id": 2}]))]);
        let config = LongPollingConfig {
            buffer_size: 1,
            ..config()
        };
        let (rx, handle) = LongPolling::new(bot, config).spawn(CancellationToken::new());

        drop(rx);
        handle.await.unwrap();
    }

    #[test]
    fn test_with_offset_and_allowed_updates() {
        let bot = ScriptedBot::new(vec![]);
        let config = LongPollingConfig {
            allowed_updates: Some(vec!["message".into()]),
            ..config()
        };
        let polling = LongPolling::new(bot, config).with_offset(42);

        let params = polling.params();
        assert_eq!(params.offset, Some(42));
        assert_eq!(params.allowed_updates, Some(vec!["message".to_string()]));
    }
}
