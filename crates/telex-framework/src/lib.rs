//! # Telex Framework
//!
//! The update dispatch core of Telex.
//!
//! - [`HandlerGroup`]: a tree of routes. Each route is a list of
//!   [`Predicate`]s plus either a handler or a nested group.
//! - [`Context::next`]: explicit chain continuation for middlewares.
//! - [`Dispatcher`]: consumes updates, resolves the first matching route and
//!   runs its chain on a task of its own, with a cancellation token per
//!   update derived from the dispatcher's.
//! - [`predicates`] and [`middleware`]: ready-made building blocks.
//!
//! ```text
//!  mpsc::Receiver<Update>
//!           │
//!           ▼
//!     ┌────────────┐  resolve   ┌──────────────┐
//!     │ Dispatcher │──────────▶ │ HandlerGroup │
//!     └────────────┘            └──────────────┘
//!           │ spawn per update          │ [mw.., handler]
//!           ▼                           ▼
//!      Context::next ──▶ mw ──▶ mw ──▶ handler
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod group;
pub mod handler;
pub mod middleware;
pub mod predicate;
pub mod predicates;

#[cfg(test)]
mod test_util;

pub use context::Context;
pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherState};
pub use error::{BoxError, HandlerError, HandlerResult};
pub use group::HandlerGroup;
pub use handler::{BoxFuture, BoxedHandler, Handler, into_handler};
pub use predicate::Predicate;
