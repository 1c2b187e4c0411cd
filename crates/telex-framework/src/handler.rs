//! Handler system for the Telex framework.
//!
//! A handler is any async function of `(Context, Update)` returning a
//! [`HandlerResult`]. Middlewares are handlers too: the only difference is
//! that they call [`Context::next`] to hand the update to the rest of the
//! chain.
//!
//! ```rust,ignore
//! async fn greet(ctx: Context, update: Update) -> HandlerResult {
//!     let chat_id = update.chat_id().unwrap_or_default();
//!     ctx.bot().send_message(&SendMessageParams::new(chat_id, "Hello")).await?;
//!     Ok(())
//! }
//!
//! async fn audit(ctx: Context, update: Update) -> HandlerResult {
//!     tracing::info!(update_id = update.update_id, "incoming");
//!     ctx.next(update).await
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use telex_core::Update;

use crate::context::Context;
use crate::error::HandlerResult;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler that can be stored in routes and chains.
pub type BoxedHandler = Arc<dyn Handler>;

// ============================================================================
// Handler Trait
// ============================================================================

/// The unit of work run for a matched update, and every middleware link
/// before it.
///
/// Implemented for every `Fn(Context, Update) -> impl Future<Output =
/// HandlerResult>`, so plain async functions and closures can be registered
/// directly.
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler.
    fn call(&self, ctx: Context, update: Update) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context, Update) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context, update: Update) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(ctx, update))
    }
}

/// Converts a handler into its shared, type-erased form.
pub fn into_handler<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

/// Adapts a handler of one payload type into a full [`Handler`].
///
/// `extract` picks the payload out of the update; when it returns `None` the
/// adapted handler does nothing.
pub(crate) fn payload_handler<T, F, Fut>(extract: fn(Update) -> Option<T>, handler: F) -> BoxedHandler
where
    T: Send + 'static,
    F: Fn(Context, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    into_handler(move |ctx: Context, update: Update| {
        let fut = extract(update).map(|payload| handler(ctx, payload));
        async move {
            match fut {
                Some(fut) => fut.await,
                None => Ok(()),
            }
        }
    })
}
