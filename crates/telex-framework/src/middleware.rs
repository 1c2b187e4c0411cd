//! Built-in middlewares.
//!
//! ```rust,ignore
//! use telex_framework::middleware;
//!
//! root.use_middlewares([
//!     middleware::log_updates(),
//!     middleware::panic_recovery(),
//!     middleware::timeout(Duration::from_secs(30)),
//! ]);
//! ```

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{Instrument, debug, error, info_span, warn};

use telex_core::Update;

use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{BoxedHandler, into_handler};

/// Catches a panic anywhere in the rest of the chain and turns it into
/// [`HandlerError::Panic`].
pub fn panic_recovery() -> BoxedHandler {
    into_handler(|ctx: Context, update: Update| async move {
        match AssertUnwindSafe(ctx.next(update)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let err = HandlerError::from_panic(&*payload);
                error!(update_id = ctx.update_id(), error = %err, "Recovered from handler panic");
                Err(err.into())
            }
        }
    })
}

/// Gives the rest of the chain `limit` to finish. On expiry the update is
/// cancelled and [`HandlerError::Timeout`] is returned.
pub fn timeout(limit: Duration) -> BoxedHandler {
    into_handler(move |ctx: Context, update: Update| async move {
        match tokio::time::timeout(limit, ctx.next(update)).await {
            Ok(result) => result,
            Err(_) => {
                ctx.cancel();
                Err(HandlerError::Timeout(limit).into())
            }
        }
    })
}

/// Wraps the rest of the chain in an `update` span and logs its outcome and
/// duration.
pub fn log_updates() -> BoxedHandler {
    into_handler(|ctx: Context, update: Update| {
        let span = info_span!("update", update_id = update.update_id, kind = %update.kind());
        async move {
            let started = Instant::now();
            let result = ctx.next(update).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => debug!(elapsed_ms, "Update handled"),
                Err(err) => warn!(elapsed_ms, error = %err, "Update handling failed"),
            }
            result
        }
        .instrument(span)
    })
}
