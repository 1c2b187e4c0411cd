//! Per-update dispatch context.
//!
//! One [`Context`] is created for every update the dispatcher accepts. It
//! carries:
//!
//! - the update's **cancellation token**, a child of the dispatcher's token,
//!   so stopping the dispatcher cancels every in-flight update while
//!   cancelling one update affects only that update;
//! - the **bot** handle, for outbound API calls;
//! - a **state map** shared by every link of the update's chain, so a
//!   middleware can leave data for the handler;
//! - the resolved **chain** and a cursor into it, which is what makes
//!   [`Context::next`] work.
//!
//! ```text
//!   chain:  [ mw_outer, mw_inner, handler ]
//!              ▲ cursor=1 in the ctx mw_outer receives
//!
//!   mw_outer ──next()──▶ mw_inner ──next()──▶ handler ──next()──▶ Ok(())
//! ```
//!
//! Cloning a `Context` is cheap; all clones share the token, the bot and the
//! state map.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use telex_core::{BoxedBot, Update};

use crate::error::{HandlerError, HandlerResult};
use crate::handler::BoxedHandler;

type StateMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Data shared by all clones of one update's context.
struct Shared {
    token: CancellationToken,
    bot: BoxedBot,
    update_id: i64,
    state: Mutex<StateMap>,
}

/// The context handed to every handler and middleware.
#[derive(Clone)]
pub struct Context {
    shared: Arc<Shared>,
    chain: Arc<[BoxedHandler]>,
    /// Index of the link [`Context::next`] will run.
    cursor: usize,
}

impl Context {
    /// Creates a context with an empty chain.
    ///
    /// The dispatcher builds one per update; constructing one by hand is
    /// mostly useful for testing handlers in isolation.
    pub fn new(bot: BoxedBot, update_id: i64, token: CancellationToken) -> Self {
        Self {
            shared: Arc::new(Shared {
                token,
                bot,
                update_id,
                state: Mutex::new(HashMap::new()),
            }),
            chain: Arc::from(Vec::new()),
            cursor: 0,
        }
    }

    /// Returns a context over `chain`, positioned at its first link.
    pub(crate) fn with_chain(&self, chain: Arc<[BoxedHandler]>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            chain,
            cursor: 0,
        }
    }

    // ─── Chain continuation ──────────────────────────────────────────────────

    /// Hands `update` to the next link of the chain and returns its result.
    ///
    /// The link receives a context whose cursor points one further, so its
    /// own `next` continues from there. Calling `next` from the last link
    /// returns `Ok(())`. If the update has been cancelled the next link is
    /// not started and [`HandlerError::Cancelled`] is returned.
    pub async fn next(&self, update: Update) -> HandlerResult {
        if self.is_cancelled() {
            return Err(HandlerError::Cancelled.into());
        }
        let Some(link) = self.chain.get(self.cursor) else {
            return Ok(());
        };
        let ctx = Self {
            shared: Arc::clone(&self.shared),
            chain: Arc::clone(&self.chain),
            cursor: self.cursor + 1,
        };
        link.call(ctx, update).await
    }

    /// Number of links left to run after the current one.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.cursor)
    }

    // ─── Cancellation ────────────────────────────────────────────────────────

    /// Returns this update's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.shared.token
    }

    /// Returns `true` once the update has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    /// Completes when the update is cancelled.
    ///
    /// Long-running handlers should select on this.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shared.token.cancelled()
    }

    /// Cancels this update only. Other updates and the dispatcher are
    /// unaffected.
    pub fn cancel(&self) {
        self.shared.token.cancel();
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    /// Returns the bot the update arrived on.
    pub fn bot(&self) -> &BoxedBot {
        &self.shared.bot
    }

    /// Returns the id of the update being dispatched.
    pub fn update_id(&self) -> i64 {
        self.shared.update_id
    }

    // ─── State ───────────────────────────────────────────────────────────────

    /// Stores a value in the update's state map, replacing any value of the
    /// same type.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.shared
            .state
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a clone of the stored value of type `T`.
    pub fn get_state<T: Clone + 'static>(&self) -> Option<T> {
        self.shared
            .state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn has_state<T: 'static>(&self) -> bool {
        self.shared.state.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns the stored value of type `T`.
    pub fn take_state<T: 'static>(&self) -> Option<T> {
        self.shared
            .state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("update_id", &self.shared.update_id)
            .field("cursor", &self.cursor)
            .field("chain_len", &self.chain.len())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    use crate::handler::into_handler;
    use crate::test_util::{noop_bot, text_update};

    fn context() -> Context {
        Context::new(noop_bot(), 1, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_next_past_end_is_ok() {
        let ctx = context();
        assert_ok!(ctx.next(text_update(1, "hi")).await);
    }

    #[tokio::test]
    async fn test_next_passes_mutated_update() {
        let upper = into_handler(|ctx: Context, mut update: Update| async move {
            if let Some(msg) = update.message.as_mut() {
                msg.text = msg.text.as_ref().map(|t| t.to_uppercase());
            }
            ctx.next(update).await
        });
        let record = into_handler(|ctx: Context, update: Update| async move {
            let text = update.message.and_then(|m| m.text).unwrap_or_default();
            ctx.set_state(text);
            Ok(())
        });

        let root = context();
        let ctx = root.with_chain(Arc::from(vec![upper, record]));
        ctx.next(text_update(1, "hi")).await.unwrap();

        assert_eq!(root.get_state::<String>().as_deref(), Some("HI"));
    }

    #[tokio::test]
    async fn test_next_after_cancel() {
        let called = into_handler(|ctx: Context, _update: Update| async move {
            ctx.set_state(true);
            Ok(())
        });
        let root = context();
        let ctx = root.with_chain(Arc::from(vec![called]));

        root.cancel();
        let err = assert_err!(ctx.next(text_update(1, "hi")).await);

        assert!(HandlerError::is_cancelled(&err));
        assert!(!root.has_state::<bool>());
    }

    #[tokio::test]
    async fn test_child_token_follows_parent() {
        let parent = CancellationToken::new();
        let ctx = Context::new(noop_bot(), 7, parent.child_token());
        assert!(!ctx.is_cancelled());

        parent.cancel();
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_state_roundtrip() {
        let ctx = context();
        assert!(!ctx.has_state::<u32>());

        ctx.set_state(5_u32);
        assert_eq!(ctx.get_state::<u32>(), Some(5));
        assert_eq!(ctx.clone().take_state::<u32>(), Some(5));
        assert!(!ctx.has_state::<u32>());
    }
}
