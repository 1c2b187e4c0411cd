//! Handler groups: the route tree.
//!
//! A [`HandlerGroup`] holds an ordered list of middlewares and an ordered
//! list of routes. A route is either a **leaf** (predicates plus a handler)
//! or a **branch** (predicates plus a nested group).
//!
//! # Resolution
//!
//! Routes are tried depth-first in registration order. A route matches when
//! all of its predicates pass, evaluated left to right and stopping at the
//! first `false`. The first matching leaf wins; its chain is the middlewares
//! of every group on the path from the root, outermost first, followed by the
//! handler:
//!
//! ```text
//! root  use(auth)
//! ├── leaf [command_equal("start")]      ──▶ [auth, start]
//! ├── branch [any_callback_query()]  use(ack)
//! │   ├── leaf [callback_data_prefix("vote:")]  ──▶ [auth, ack, vote]
//! │   └── leaf [callback_data_equal("close")]   ──▶ [auth, ack, close]
//! └── leaf [any_message()]               ──▶ [auth, echo]
//! ```
//!
//! When a branch's predicates pass but none of its routes match, resolution
//! falls through to the branch's next sibling. A callback query with data
//! `"other"` above enters the branch, matches nothing there, and goes on to
//! try `any_message()`.
//!
//! A group's middlewares apply to everything in the group no matter when they
//! were registered relative to its routes.

use std::future::Future;
use std::iter;

use tracing::trace;

use telex_core::{CallbackQuery, ChatJoinRequest, ChosenInlineResult, InlineQuery, Message, Update};

use crate::context::Context;
use crate::error::HandlerResult;
use crate::handler::{BoxedHandler, into_handler, payload_handler};
use crate::predicate::Predicate;
use crate::predicates;

/// One entry of a group.
#[derive(Clone)]
enum Route {
    Leaf {
        predicates: Vec<Predicate>,
        handler: BoxedHandler,
    },
    Branch {
        predicates: Vec<Predicate>,
        group: HandlerGroup,
    },
}

impl Route {
    fn predicates(&self) -> &[Predicate] {
        match self {
            Self::Leaf { predicates, .. } | Self::Branch { predicates, .. } => predicates,
        }
    }
}

/// A node of the route tree.
#[derive(Clone, Default)]
pub struct HandlerGroup {
    middlewares: Vec<BoxedHandler>,
    routes: Vec<Route>,
}

impl HandlerGroup {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Adds a route that runs `handler` when all `predicates` pass.
    ///
    /// With no predicates the route matches every update.
    pub fn handle<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, Update) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(into_handler(handler), predicates)
    }

    /// Adds a route with an already type-erased handler.
    pub fn handle_boxed(
        &mut self,
        handler: BoxedHandler,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self {
        self.routes.push(Route::Leaf {
            predicates: predicates.into_iter().collect(),
            handler,
        });
        self
    }

    /// Adds an empty subgroup guarded by `predicates` and returns it for
    /// registration.
    pub fn group(&mut self, predicates: impl IntoIterator<Item = Predicate>) -> &mut HandlerGroup {
        self.nest(HandlerGroup::new(), predicates);
        match self.routes.last_mut() {
            Some(Route::Branch { group, .. }) => group,
            _ => unreachable!("a branch was just pushed"),
        }
    }

    /// Adds a pre-built subgroup guarded by `predicates`.
    pub fn nest(
        &mut self,
        group: HandlerGroup,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self {
        self.routes.push(Route::Branch {
            predicates: predicates.into_iter().collect(),
            group,
        });
        self
    }

    /// Appends a middleware. It must call [`Context::next`] to continue the
    /// chain.
    pub fn use_middleware<F, Fut>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(Context, Update) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.use_middleware_boxed(into_handler(middleware))
    }

    /// Appends an already type-erased middleware, such as the ones in
    /// [`crate::middleware`].
    pub fn use_middleware_boxed(&mut self, middleware: BoxedHandler) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Appends several middlewares in order.
    pub fn use_middlewares(&mut self, middlewares: impl IntoIterator<Item = BoxedHandler>) -> &mut Self {
        self.middlewares.extend(middlewares);
        self
    }

    // ─── Typed registration ──────────────────────────────────────────────────

    /// Handles new messages. The handler receives the message itself.
    pub fn handle_message<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.message, handler),
            iter::once(predicates::any_message()).chain(predicates),
        )
    }

    pub fn handle_edited_message<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.edited_message, handler),
            iter::once(predicates::any_edited_message()).chain(predicates),
        )
    }

    pub fn handle_channel_post<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.channel_post, handler),
            iter::once(predicates::any_channel_post()).chain(predicates),
        )
    }

    pub fn handle_edited_channel_post<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.edited_channel_post, handler),
            iter::once(predicates::any_edited_channel_post()).chain(predicates),
        )
    }

    /// Handles presses on inline keyboard buttons.
    pub fn handle_callback_query<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, CallbackQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.callback_query, handler),
            iter::once(predicates::any_callback_query()).chain(predicates),
        )
    }

    pub fn handle_inline_query<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, InlineQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.inline_query, handler),
            iter::once(predicates::any_inline_query()).chain(predicates),
        )
    }

    pub fn handle_chosen_inline_result<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, ChosenInlineResult) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.chosen_inline_result, handler),
            iter::once(predicates::any_chosen_inline_result()).chain(predicates),
        )
    }

    pub fn handle_chat_join_request<F, Fut>(
        &mut self,
        handler: F,
        predicates: impl IntoIterator<Item = Predicate>,
    ) -> &mut Self
    where
        F: Fn(Context, ChatJoinRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handle_boxed(
            payload_handler(|u| u.chat_join_request, handler),
            iter::once(predicates::any_chat_join_request()).chain(predicates),
        )
    }

    // ─── Resolution ───────────────────────────────────────────────────────────

    /// Finds the first route matching `update` and returns its chain:
    /// middlewares outermost first, then the handler. Returns `None` when no
    /// route matches.
    ///
    /// Resolution only reads the tree, so the same update always resolves to
    /// the same chain.
    pub fn resolve(&self, ctx: &Context, update: &Update) -> Option<Vec<BoxedHandler>> {
        let mut chain = Vec::new();
        self.resolve_into(ctx, update, 0, &mut chain).then_some(chain)
    }

    fn resolve_into(
        &self,
        ctx: &Context,
        update: &Update,
        depth: usize,
        chain: &mut Vec<BoxedHandler>,
    ) -> bool {
        let base = chain.len();
        chain.extend(self.middlewares.iter().cloned());

        for (index, route) in self.routes.iter().enumerate() {
            if !route.predicates().iter().all(|p| p.check(ctx, update)) {
                continue;
            }

            match route {
                Route::Leaf { handler, .. } => {
                    trace!(depth, route = index, "Route matched");
                    chain.push(handler.clone());
                    return true;
                }
                Route::Branch { group, .. } => {
                    if group.resolve_into(ctx, update, depth + 1, chain) {
                        return true;
                    }
                    trace!(depth, route = index, "No route in subgroup matched, falling through");
                }
            }
        }

        chain.truncate(base);
        false
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    /// Number of routes directly in this group.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Number of middlewares directly on this group.
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if the group has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for HandlerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerGroup")
            .field("middleware_count", &self.middlewares.len())
            .field("route_count", &self.routes.len())
            .finish()
    }
}
