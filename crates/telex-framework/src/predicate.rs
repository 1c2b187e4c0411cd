//! The [`Predicate`] type.
//!
//! A predicate decides whether a route applies to an update. It gets a
//! shared borrow of the update, so one route's predicates can never change
//! what the next route sees.
//!
//! Ready-made predicates live in [`crate::predicates`].

use std::fmt;
use std::sync::Arc;

use telex_core::Update;

use crate::context::Context;

type PredicateFn = dyn Fn(&Context, &Update) -> bool + Send + Sync;

/// A cheaply clonable boolean test over an update.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, &Update) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluates the predicate.
    pub fn check(&self, ctx: &Context, update: &Update) -> bool {
        (self.0)(ctx, update)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}
