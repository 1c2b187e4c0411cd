//! The update dispatcher.
//!
//! The [`Dispatcher`] consumes updates from an Event Source (any
//! `mpsc::Receiver<Update>`), resolves each one against the root
//! [`HandlerGroup`] and runs the resulting chain on its own task.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                 stop() / source closed
//! Created ─────────────▶ Running ─────────────────────────▶ Stopping ──▶ Stopped
//!    ▲                                                                     │
//!    └──────────────────────────── start() ◀───────────────────────────────┘
//! ```
//!
//! [`Dispatcher::start`] runs the intake loop and only returns once the
//! dispatcher is stopped or the source closes. [`Dispatcher::stop`] cancels
//! the dispatcher's token, which every in-flight update's token is a child
//! of, then waits until all in-flight chains have returned.
//!
//! # Example
//!
//! ```rust,ignore
//! let (tx, rx) = mpsc::channel(100);
//! let mut dispatcher = Dispatcher::new(bot, rx);
//! dispatcher.handlers_mut().handle(echo, [predicates::any_message()]);
//!
//! let dispatcher = Arc::new(dispatcher);
//! let running = tokio::spawn({
//!     let dispatcher = Arc::clone(&dispatcher);
//!     async move { dispatcher.start().await }
//! });
//! // ...
//! dispatcher.stop().await;
//! running.await?;
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Level, debug, error, info, span, trace, warn};

use telex_core::{BoxedBot, Update};

use crate::context::Context;
use crate::error::{HandlerError, HandlerResult};
use crate::group::HandlerGroup;

// =============================================================================
// Configuration
// =============================================================================

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Capacity of the update channel built by [`DispatcherConfig::channel`].
    pub buffer_size: usize,
    /// Upper bound on concurrently running chains. `None` means unbounded.
    pub max_concurrency: Option<usize>,
    /// Catch panics in chains and report them as [`HandlerError::Panic`].
    pub recover_panics: bool,
    /// Deadline for every chain. On expiry the update is cancelled.
    pub handler_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            buffer_size: 100,
            max_concurrency: None,
            recover_panics: true,
            handler_timeout: None,
        }
    }
}

impl DispatcherConfig {
    /// Creates an update channel of `buffer_size` capacity.
    pub fn channel(&self) -> (mpsc::Sender<Update>, mpsc::Receiver<Update>) {
        mpsc::channel(self.buffer_size.max(1))
    }
}

// =============================================================================
// State
// =============================================================================

/// Where a dispatcher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Created,
    Running,
    Stopping,
    Stopped,
}

struct RunState {
    lifecycle: DispatcherState,
    /// Parent of every in-flight update's token. Replaced on each start.
    token: CancellationToken,
    tracker: TaskTracker,
}

/// Why the intake loop ended.
#[derive(Debug, PartialEq, Eq)]
enum Exit {
    Cancelled,
    SourceClosed,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Routes updates from an Event Source to the handler tree.
pub struct Dispatcher {
    root: Arc<HandlerGroup>,
    bot: BoxedBot,
    config: DispatcherConfig,
    /// Held by the intake loop for as long as it runs.
    updates: AsyncMutex<mpsc::Receiver<Update>>,
    state: Mutex<RunState>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty root group.
    pub fn new(bot: BoxedBot, updates: mpsc::Receiver<Update>) -> Self {
        Self::from_group(bot, updates, HandlerGroup::new())
    }

    /// Creates a dispatcher over a pre-built root group.
    pub fn from_group(bot: BoxedBot, updates: mpsc::Receiver<Update>, root: HandlerGroup) -> Self {
        Self {
            root: Arc::new(root),
            bot,
            config: DispatcherConfig::default(),
            updates: AsyncMutex::new(updates),
            state: Mutex::new(RunState {
                lifecycle: DispatcherState::Created,
                token: CancellationToken::new(),
                tracker: TaskTracker::new(),
            }),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the root group for registration.
    ///
    /// Needs exclusive access, so nothing can be registered while the
    /// dispatcher is shared with a running intake loop.
    pub fn handlers_mut(&mut self) -> &mut HandlerGroup {
        Arc::make_mut(&mut self.root)
    }

    pub fn handlers(&self) -> &HandlerGroup {
        &self.root
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.state.lock().lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.state() == DispatcherState::Running
    }

    // ─── Lifecycle ────────────────────────────────────────────────────────────

    /// Consumes updates until [`Dispatcher::stop`] is called or the source
    /// closes.
    ///
    /// Does nothing unless the dispatcher is `Created` or `Stopped`. When the
    /// source closes, waits for in-flight chains to finish (without
    /// cancelling them) before returning.
    pub async fn start(&self) {
        let (token, tracker) = {
            let mut state = self.state.lock();
            match state.lifecycle {
                DispatcherState::Created | DispatcherState::Stopped => {}
                other => {
                    warn!(state = ?other, "Dispatcher is already running");
                    return;
                }
            }
            // A restart needs a fresh token and tracker. The first start keeps
            // the constructor's pair so earlier `dispatch` calls stay covered.
            if state.lifecycle == DispatcherState::Stopped {
                state.token = CancellationToken::new();
                state.tracker = TaskTracker::new();
            }
            state.lifecycle = DispatcherState::Running;
            (state.token.clone(), state.tracker.clone())
        };

        info!(
            routes = self.root.route_count(),
            max_concurrency = ?self.config.max_concurrency,
            "Dispatcher started"
        );

        let exit = self.intake(&token, &tracker).await;
        if exit == Exit::Cancelled {
            // stop() owns the rest of the shutdown.
            return;
        }

        {
            let mut state = self.state.lock();
            if state.lifecycle != DispatcherState::Running {
                return;
            }
            state.lifecycle = DispatcherState::Stopping;
        }
        info!(
            in_flight = tracker.len(),
            "Update source closed, waiting for in-flight updates"
        );
        tracker.close();
        tracker.wait().await;
        self.state.lock().lifecycle = DispatcherState::Stopped;
        info!("Dispatcher stopped");
    }

    /// Stops accepting updates, cancels every in-flight update and waits for
    /// their chains to return.
    ///
    /// Does nothing unless the dispatcher is `Running`.
    pub async fn stop(&self) {
        let (token, tracker) = {
            let mut state = self.state.lock();
            if state.lifecycle != DispatcherState::Running {
                warn!(state = ?state.lifecycle, "Dispatcher is not running");
                return;
            }
            state.lifecycle = DispatcherState::Stopping;
            (state.token.clone(), state.tracker.clone())
        };

        info!(in_flight = tracker.len(), "Stopping dispatcher");
        token.cancel();

        // The intake loop releases the source when it exits.
        drop(self.updates.lock().await);

        tracker.close();
        tracker.wait().await;
        self.state.lock().lifecycle = DispatcherState::Stopped;
        info!("Dispatcher stopped");
    }

    /// Dispatches one update on the current task and waits for its chain.
    ///
    /// Uses the same resolution, panic recovery and timeout as the intake
    /// loop. Useful for webhook-style callers that already own a task per
    /// request, and for tests.
    ///
    /// The chain counts as in flight, so [`Dispatcher::stop`] cancels it and
    /// waits for it. Updates are dropped once the dispatcher is stopping or
    /// stopped.
    pub async fn dispatch(&self, update: Update) {
        let chain = {
            let state = self.state.lock();
            match state.lifecycle {
                DispatcherState::Created | DispatcherState::Running => {}
                other => {
                    warn!(
                        update_id = update.update_id,
                        state = ?other,
                        "Dispatcher is not accepting updates, dropping update"
                    );
                    return;
                }
            }
            // Registered before the lock is released so a concurrent stop()
            // always waits for it.
            state
                .tracker
                .track_future(self.run_update(state.token.child_token(), update))
        };
        chain.await;
    }

    // ─── Internals ────────────────────────────────────────────────────────────

    async fn intake(&self, token: &CancellationToken, tracker: &TaskTracker) -> Exit {
        let mut updates = self.updates.lock().await;
        let limiter = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        loop {
            let update = tokio::select! {
                biased;
                _ = token.cancelled() => return Exit::Cancelled,
                update = updates.recv() => match update {
                    Some(update) => update,
                    None => return Exit::SourceClosed,
                },
            };

            let permit = match &limiter {
                Some(limiter) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Exit::Cancelled,
                    permit = Arc::clone(limiter).acquire_owned() => permit.ok(),
                },
                None => None,
            };

            trace!(update_id = update.update_id, "Update received");
            let event_token = token.child_token();
            let task = self.task_handle();
            tracker.spawn(async move {
                let _permit = permit;
                task.run_update(event_token, update).await;
            });
        }
    }

    /// The parts of the dispatcher a spawned update task needs.
    fn task_handle(&self) -> UpdateTask {
        UpdateTask {
            root: Arc::clone(&self.root),
            bot: Arc::clone(&self.bot),
            recover_panics: self.config.recover_panics,
            handler_timeout: self.config.handler_timeout,
        }
    }

    async fn run_update(&self, token: CancellationToken, update: Update) {
        self.task_handle().run_update(token, update).await;
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Per-update task
// =============================================================================

struct UpdateTask {
    root: Arc<HandlerGroup>,
    bot: BoxedBot,
    recover_panics: bool,
    handler_timeout: Option<Duration>,
}

impl UpdateTask {
    async fn run_update(self, token: CancellationToken, update: Update) {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            update_id = update.update_id,
            kind = %update.kind()
        );

        async move {
            let ctx = Context::new(self.bot.clone(), update.update_id, token);
            // The update's token never outlives its chain.
            let _guard = ctx.token().clone().drop_guard();

            let Some(chain) = self.root.resolve(&ctx, &update) else {
                debug!("No route matched, dropping update");
                return;
            };
            debug!(chain_len = chain.len(), "Route resolved");

            let ctx = ctx.with_chain(chain.into());
            match self.run_chain(&ctx, update).await {
                Ok(()) => trace!("Update handled"),
                Err(err) if HandlerError::is_cancelled(&err) => debug!("Update cancelled"),
                Err(err) => error!(
                    update_id = ctx.update_id(),
                    error = %err,
                    "Handler failed"
                ),
            }
        }
        .instrument(span)
        .await
    }

    async fn run_chain(&self, ctx: &Context, update: Update) -> HandlerResult {
        let chain = async {
            match self.handler_timeout {
                Some(limit) => match tokio::time::timeout(limit, ctx.next(update)).await {
                    Ok(result) => result,
                    Err(_) => {
                        ctx.cancel();
                        Err(HandlerError::Timeout(limit).into())
                    }
                },
                None => ctx.next(update).await,
            }
        };

        if !self.recover_panics {
            return chain.await;
        }
        match AssertUnwindSafe(chain).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(HandlerError::from_panic(&*payload).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex as SyncMutex;
    use tokio::sync::Notify;

    use crate::handler::into_handler;
    use crate::middleware;
    use crate::predicates::{any, text_equal};
    use crate::test_util::{noop_bot, text_update};

    fn dispatcher(root: HandlerGroup) -> (mpsc::Sender<Update>, Arc<Dispatcher>) {
        let (tx, rx) = mpsc::channel(16);
        (tx, Arc::new(Dispatcher::from_group(noop_bot(), rx, root)))
    }

    fn spawn_start(dispatcher: &Arc<Dispatcher>) -> tokio::task::JoinHandle<()> {
        let dispatcher = Arc::clone(dispatcher);
        tokio::spawn(async move { dispatcher.start().await })
    }

    async fn explode(_ctx: Context, _update: Update) -> HandlerResult {
        panic!("boom")
    }

    async fn wait_running(dispatcher: &Dispatcher) {
        while !dispatcher.is_running() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let (tx, dispatcher) = dispatcher(HandlerGroup::new());
        assert_eq!(dispatcher.state(), DispatcherState::Created);

        // stop before start is a no-op
        dispatcher.stop().await;
        assert_eq!(dispatcher.state(), DispatcherState::Created);

        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;

        // start while running is a no-op and returns immediately
        dispatcher.start().await;
        assert!(dispatcher.is_running());

        dispatcher.stop().await;
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
        running.await.unwrap();

        // restart with the same source
        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;
        drop(tx);
        running.await.unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_source_close_drains_in_flight() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut root = HandlerGroup::new();
        {
            let done = Arc::clone(&done);
            root.handle(
                move |_ctx, _update| {
                    let done = Arc::clone(&done);
                    async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        done.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, dispatcher) = dispatcher(root);

        for id in 0..3 {
            tx.send(text_update(id, "hi")).await.unwrap();
        }
        drop(tx);
        dispatcher.start().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_cancels_in_flight() {
        let started = Arc::new(Notify::new());
        let observed = Arc::new(AtomicBool::new(false));
        let mut root = HandlerGroup::new();
        {
            let started = Arc::clone(&started);
            let observed = Arc::clone(&observed);
            root.handle(
                move |ctx, _update| {
                    let started = Arc::clone(&started);
                    let observed = Arc::clone(&observed);
                    async move {
                        started.notify_one();
                        ctx.cancelled().await;
                        observed.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, dispatcher) = dispatcher(root);
        let running = spawn_start(&dispatcher);

        tx.send(text_update(1, "hi")).await.unwrap();
        started.notified().await;
        dispatcher.stop().await;

        assert!(observed.load(Ordering::SeqCst));
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
        running.await.unwrap();
    }

    #[tokio::test]
    async fn test_no_new_work_after_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut root = HandlerGroup::new();
        {
            let calls = Arc::clone(&calls);
            root.handle(
                move |_ctx, _update| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, dispatcher) = dispatcher(root);
        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;

        dispatcher.stop().await;
        running.await.unwrap();
        tx.send(text_update(1, "late")).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_updates_finish_independently() {
        let finished = Arc::new(SyncMutex::new(Vec::new()));
        let mut root = HandlerGroup::new();
        {
            let finished = Arc::clone(&finished);
            root.handle(
                move |_ctx, update: Update| {
                    let finished = Arc::clone(&finished);
                    async move {
                        let delay = if update.update_id == 1 { 200 } else { 10 };
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        finished.lock().push(update.update_id);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, dispatcher) = dispatcher(root);

        tx.send(text_update(1, "slow")).await.unwrap();
        tx.send(text_update(2, "fast")).await.unwrap();
        drop(tx);
        dispatcher.start().await;

        assert_eq!(*finished.lock(), [2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_concurrency_serializes() {
        let finished = Arc::new(SyncMutex::new(Vec::new()));
        let mut root = HandlerGroup::new();
        {
            let finished = Arc::clone(&finished);
            root.handle(
                move |_ctx, update: Update| {
                    let finished = Arc::clone(&finished);
                    async move {
                        let delay = if update.update_id == 1 { 200 } else { 10 };
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        finished.lock().push(update.update_id);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = Dispatcher::from_group(noop_bot(), rx, root).with_config(DispatcherConfig {
            max_concurrency: Some(1),
            ..Default::default()
        });

        tx.send(text_update(1, "slow")).await.unwrap();
        tx.send(text_update(2, "fast")).await.unwrap();
        drop(tx);
        dispatcher.start().await;

        assert_eq!(*finished.lock(), [1, 2]);
    }

    #[tokio::test]
    async fn test_panic_does_not_stop_dispatcher() {
        let handled = Arc::new(AtomicUsize::new(0));
        let mut root = HandlerGroup::new();
        root.use_middleware_boxed(middleware::panic_recovery());
        root.handle(explode, [text_equal("panic")]);
        {
            let handled = Arc::clone(&handled);
            root.handle(
                move |_ctx, _update| {
                    let handled = Arc::clone(&handled);
                    async move {
                        handled.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, dispatcher) = dispatcher(root);

        tx.send(text_update(1, "panic")).await.unwrap();
        tx.send(text_update(2, "fine")).await.unwrap();
        tx.send(text_update(3, "fine")).await.unwrap();
        drop(tx);
        dispatcher.start().await;

        assert_eq!(handled.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_unrecovered_panic_is_isolated_to_its_task() {
        let handled = Arc::new(AtomicUsize::new(0));
        let mut root = HandlerGroup::new();
        root.handle(explode, [text_equal("panic")]);
        {
            let handled = Arc::clone(&handled);
            root.handle(
                move |_ctx, _update| {
                    let handled = Arc::clone(&handled);
                    async move {
                        handled.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (tx, rx) = mpsc::channel(16);
        let dispatcher = Dispatcher::from_group(noop_bot(), rx, root).with_config(DispatcherConfig {
            recover_panics: false,
            ..Default::default()
        });

        tx.send(text_update(1, "panic")).await.unwrap();
        tx.send(text_update(2, "fine")).await.unwrap();
        drop(tx);
        dispatcher.start().await;

        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_timeout_abandons_chain() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut root = HandlerGroup::new();
        {
            let finished = Arc::clone(&finished);
            root.handle(
                move |_ctx, _update| {
                    let finished = Arc::clone(&finished);
                    async move {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        finished.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (_tx, rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::from_group(noop_bot(), rx, root).with_config(DispatcherConfig {
            handler_timeout: Some(Duration::from_secs(1)),
            ..Default::default()
        });

        let started = tokio::time::Instant::now();
        dispatcher.dispatch(text_update(1, "hi")).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dispatch_scenarios() {
        let log = Arc::new(SyncMutex::new(Vec::new()));
        let mut root = HandlerGroup::new();
        {
            let log = Arc::clone(&log);
            root.use_middleware(move |ctx, update| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push("mw");
                    ctx.next(update).await
                }
            });
        }
        {
            let log = Arc::clone(&log);
            root.handle(
                move |_ctx, _update| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().push("Hello");
                        Ok(())
                    }
                },
                [text_equal("Hi")],
            );
        }
        let (_tx, dispatcher) = dispatcher(root);

        dispatcher.dispatch(text_update(1, "Hi")).await;
        assert_eq!(*log.lock(), ["mw", "Hello"]);

        log.lock().clear();
        dispatcher.dispatch(text_update(2, "Bye")).await;
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_stop_waits_for_dispatched_chain() {
        let entered = Arc::new(Notify::new());
        let finished = Arc::new(AtomicBool::new(false));
        let mut root = HandlerGroup::new();
        {
            let entered = Arc::clone(&entered);
            let finished = Arc::clone(&finished);
            root.handle(
                move |ctx: Context, _update| {
                    let entered = Arc::clone(&entered);
                    let finished = Arc::clone(&finished);
                    async move {
                        entered.notify_one();
                        ctx.cancelled().await;
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        finished.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (_tx, dispatcher) = dispatcher(root);
        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;

        let dispatched = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch(text_update(1, "hi")).await }
        });
        entered.notified().await;

        dispatcher.stop().await;
        assert!(finished.load(Ordering::SeqCst));

        dispatched.await.unwrap();
        running.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_before_start_is_cancelled_by_stop() {
        let entered = Arc::new(Notify::new());
        let observed = Arc::new(AtomicBool::new(false));
        let mut root = HandlerGroup::new();
        {
            let entered = Arc::clone(&entered);
            let observed = Arc::clone(&observed);
            root.handle(
                move |ctx: Context, _update| {
                    let entered = Arc::clone(&entered);
                    let observed = Arc::clone(&observed);
                    async move {
                        entered.notify_one();
                        ctx.cancelled().await;
                        observed.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (_tx, dispatcher) = dispatcher(root);

        let dispatched = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch(text_update(1, "early")).await }
        });
        entered.notified().await;

        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;
        dispatcher.stop().await;

        assert!(observed.load(Ordering::SeqCst));
        dispatched.await.unwrap();
        running.await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_after_stop_is_dropped() {
        let handled = Arc::new(AtomicUsize::new(0));
        let mut root = HandlerGroup::new();
        {
            let handled = Arc::clone(&handled);
            root.handle(
                move |_ctx, _update| {
                    let handled = Arc::clone(&handled);
                    async move {
                        handled.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                [any()],
            );
        }
        let (_tx, dispatcher) = dispatcher(root);
        let running = spawn_start(&dispatcher);
        wait_running(&dispatcher).await;
        dispatcher.stop().await;
        running.await.unwrap();

        dispatcher.dispatch(text_update(1, "late")).await;
        assert_eq!(handled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handlers_mut_registers_routes() {
        let (_tx, rx) = mpsc::channel(1);
        let mut dispatcher = Dispatcher::new(noop_bot(), rx);
        dispatcher
            .handlers_mut()
            .handle_boxed(into_handler(|_ctx: Context, _update: Update| async move { Ok(()) }), []);

        assert_eq!(dispatcher.handlers().route_count(), 1);
    }
}
