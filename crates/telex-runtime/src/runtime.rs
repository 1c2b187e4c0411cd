//! Runtime orchestration.
//!
//! [`TelexRuntime`] wires the pieces together: it validates the
//! configuration, installs logging, builds the [`HttpBot`], starts the
//! configured Event Source and a [`Dispatcher`] over the root
//! [`HandlerGroup`], and tears everything down again on shutdown.
//!
//! ```text
//! run() ─▶ Event Source ──mpsc──▶ Dispatcher ──▶ handlers
//!            │                        │
//! shutdown ──┴── cancel ──────────────┴── stop()   (then deleteWebhook)
//! ```
//!
//! ```rust,ignore
//! use telex_runtime::TelexRuntime;
//!
//! let mut runtime = TelexRuntime::builder().profile("production").build()?;
//! runtime.handlers_mut().handle_message(echo, []);
//! runtime.run().await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use telex_core::{BotApi, BoxedBot, DeleteWebhookParams, SetWebhookParams, Update};
use telex_framework::{Dispatcher, HandlerGroup};
use telex_transport::{HttpBot, LongPolling, serve, webhook_router};

use crate::config::{ConfigLoader, TelexConfig, UpdatesConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

type SourceHandle = JoinHandle<RuntimeResult<()>>;

/// Owns the configuration, the bot client and the root handler group.
pub struct TelexRuntime {
    config: TelexConfig,
    bot: BoxedBot,
    handlers: HandlerGroup,
}

impl TelexRuntime {
    /// Creates a runtime builder that loads configuration from the usual
    /// places.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config`, initializes logging and builds the HTTP client.
    pub fn from_config(config: TelexConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let bot = HttpBot::with_config(&config.bot.token, config.bot.to_http_config())?;
        info!(
            bot_id = bot.bot_id(),
            updates = config.updates.mode(),
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self::with_bot(config, Arc::new(bot)))
    }

    /// Uses `bot` instead of an HTTP client. Skips validation and logging
    /// setup.
    pub fn with_bot(config: TelexConfig, bot: BoxedBot) -> Self {
        Self {
            config,
            bot,
            handlers: HandlerGroup::new(),
        }
    }

    pub fn config(&self) -> &TelexConfig {
        &self.config
    }

    pub fn bot(&self) -> &BoxedBot {
        &self.bot
    }

    /// The root group every update is resolved against.
    pub fn handlers_mut(&mut self) -> &mut HandlerGroup {
        &mut self.handlers
    }

    pub fn handlers(&self) -> &HandlerGroup {
        &self.handlers
    }

    /// Runs until Ctrl+C or SIGTERM.
    pub async fn run(self) -> RuntimeResult<()> {
        let shutdown = shutdown_signal()?;
        info!("Telex runtime is now running. Press Ctrl+C to stop.");
        self.run_until(shutdown).await
    }

    /// Runs until `shutdown` completes or the Event Source fails.
    pub async fn run_until<F>(self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            config,
            bot,
            handlers,
        } = self;

        let dispatcher_config = config.dispatcher.to_dispatcher_config();
        let (sender, receiver) = dispatcher_config.channel();
        let token = CancellationToken::new();

        let mut source = start_source(
            &config.updates,
            &bot,
            sender,
            config.dispatcher.buffer_size,
            token.child_token(),
        )
        .await?;

        let dispatcher = Dispatcher::from_group(Arc::clone(&bot), receiver, handlers)
            .with_config(dispatcher_config);
        let intake = dispatcher.start();
        tokio::pin!(intake);
        let mut intake_done = false;

        info!(updates = config.updates.mode(), "Telex runtime started");

        // The intake is polled first, so the dispatcher is `Running` before
        // a shutdown can be observed and stop() below always applies.
        let finished = tokio::select! {
            biased;
            () = &mut intake => {
                intake_done = true;
                None
            }
            _ = shutdown => None,
            result = &mut source => Some(result),
        };

        token.cancel();
        if !intake_done {
            // stop() waits for the intake to release the source, so both are
            // driven together.
            tokio::join!(dispatcher.stop(), &mut intake);
        }

        let finished = match finished {
            Some(result) => result,
            None => source.await,
        };
        let outcome = finished.unwrap_or_else(|err| Err(RuntimeError::SourceTask(err.to_string())));
        if let Err(err) = &outcome {
            error!(error = %err, "Event source failed");
        }

        if let UpdatesConfig::Webhook(settings) = &config.updates
            && settings.public_url.is_some()
            && settings.delete_on_shutdown
        {
            match bot.delete_webhook(&DeleteWebhookParams::default()).await {
                Ok(_) => info!("Webhook deleted"),
                Err(err) => warn!(error = %err, "Failed to delete webhook"),
            }
        }

        info!("Telex runtime stopped");
        outcome
    }
}

/// Registers the webhook if needed and spawns the Event Source feeding
/// `sender`.
async fn start_source(
    updates: &UpdatesConfig,
    bot: &BoxedBot,
    sender: tokio::sync::mpsc::Sender<Update>,
    buffer_size: usize,
    token: CancellationToken,
) -> RuntimeResult<SourceHandle> {
    match updates {
        UpdatesConfig::LongPolling(settings) => {
            // getUpdates is refused while a webhook is registered.
            bot.delete_webhook(&DeleteWebhookParams {
                drop_pending_updates: settings.drop_pending_updates.then_some(true),
            })
            .await?;

            let polling = LongPolling::new(Arc::clone(bot), settings.to_polling_config(buffer_size));
            Ok(tokio::spawn(async move {
                polling.run(sender, token).await;
                Ok(())
            }))
        }
        UpdatesConfig::Webhook(settings) => {
            if let Some(url) = &settings.public_url {
                bot.set_webhook(&SetWebhookParams {
                    url: url.clone(),
                    secret_token: settings.secret_token.clone(),
                    max_connections: settings.max_connections,
                    allowed_updates: settings.allowed_updates.clone(),
                    drop_pending_updates: settings.drop_pending_updates.then_some(true),
                })
                .await?;
                info!(url = %url, "Webhook registered");
            }

            let router = webhook_router(&settings.path, settings.secret_token.clone(), sender);
            let listen = settings.listen.clone();
            Ok(tokio::spawn(async move {
                serve(listen, router, token)
                    .await
                    .map_err(RuntimeError::from)
            }))
        }
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
fn shutdown_signal() -> RuntimeResult<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(RuntimeError::Signal)?;

    Ok(async move {
        #[cfg(unix)]
        tokio::select! {
            result = signal::ctrl_c() => log_ctrl_c(result),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        }

        #[cfg(not(unix))]
        log_ctrl_c(signal::ctrl_c().await);
    })
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for a [`TelexRuntime`] backed by [`ConfigLoader`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges a base configuration that files and the environment override.
    pub fn merge(mut self, config: TelexConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    pub fn build(self) -> RuntimeResult<TelexRuntime> {
        let config = self.config_loader.load()?;
        TelexRuntime::from_config(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
