//! Ready-made predicates.
//!
//! Every function returns a [`Predicate`] that can be passed to
//! [`HandlerGroup::handle`](crate::HandlerGroup::handle) or
//! [`HandlerGroup::group`](crate::HandlerGroup::group).
//!
//! ```rust,ignore
//! use telex_framework::predicates::{any_message, command_equal, not, text_prefix};
//!
//! group.handle(start, [command_equal("start")]);
//! group.handle(echo, [any_message(), not(text_prefix("/"))]);
//! ```
//!
//! Text and command predicates look at `update.message` only, never at edited
//! messages or channel posts.

mod command;
mod text;

pub use command::{
    ParsedCommand, any_command, command_equal, command_equal_argc, command_equal_argv,
    parse_command,
};
pub use text::{
    any_message_with_text, text_contains, text_equal, text_equal_fold, text_matches,
    text_prefix, text_suffix,
};

use telex_core::ChatType;

use crate::predicate::Predicate;

// ============================================================================
// Combinators
// ============================================================================

/// Always `true`.
pub fn any() -> Predicate {
    Predicate::new(|_, _| true)
}

/// Always `false`.
pub fn none() -> Predicate {
    Predicate::new(|_, _| false)
}

/// `true` if every predicate is, evaluated left to right with short-circuit.
/// An empty list is `true`.
pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Predicate::new(move |ctx, update| predicates.iter().all(|p| p.check(ctx, update)))
}

/// `true` if any predicate is, evaluated left to right with short-circuit.
/// An empty list is `false`.
pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    let predicates: Vec<Predicate> = predicates.into_iter().collect();
    Predicate::new(move |ctx, update| predicates.iter().any(|p| p.check(ctx, update)))
}

/// Negates a predicate.
pub fn not(predicate: Predicate) -> Predicate {
    Predicate::new(move |ctx, update| !predicate.check(ctx, update))
}

// ============================================================================
// Update kinds
// ============================================================================

pub fn any_message() -> Predicate {
    Predicate::new(|_, update| update.message.is_some())
}

pub fn any_edited_message() -> Predicate {
    Predicate::new(|_, update| update.edited_message.is_some())
}

pub fn any_channel_post() -> Predicate {
    Predicate::new(|_, update| update.channel_post.is_some())
}

pub fn any_edited_channel_post() -> Predicate {
    Predicate::new(|_, update| update.edited_channel_post.is_some())
}

pub fn any_callback_query() -> Predicate {
    Predicate::new(|_, update| update.callback_query.is_some())
}

/// A callback query whose originating message is available.
pub fn any_callback_query_with_message() -> Predicate {
    Predicate::new(|_, update| {
        update
            .callback_query
            .as_ref()
            .is_some_and(|q| q.message.is_some())
    })
}

pub fn any_inline_query() -> Predicate {
    Predicate::new(|_, update| update.inline_query.is_some())
}

pub fn any_chosen_inline_result() -> Predicate {
    Predicate::new(|_, update| update.chosen_inline_result.is_some())
}

pub fn any_chat_join_request() -> Predicate {
    Predicate::new(|_, update| update.chat_join_request.is_some())
}

// ============================================================================
// Callback and inline queries
// ============================================================================

/// Callback query data equals `data`.
pub fn callback_data_equal(data: impl Into<String>) -> Predicate {
    let data = data.into();
    Predicate::new(move |_, update| callback_data(update) == Some(data.as_str()))
}

/// Callback query data starts with `prefix`.
pub fn callback_data_prefix(prefix: impl Into<String>) -> Predicate {
    let prefix = prefix.into();
    Predicate::new(move |_, update| callback_data(update).is_some_and(|d| d.starts_with(&prefix)))
}

/// Callback query data contains `needle`.
pub fn callback_data_contains(needle: impl Into<String>) -> Predicate {
    let needle = needle.into();
    Predicate::new(move |_, update| callback_data(update).is_some_and(|d| d.contains(&needle)))
}

/// Inline query text equals `query`.
pub fn inline_query_equal(query: impl Into<String>) -> Predicate {
    let query = query.into();
    Predicate::new(move |_, update| {
        update
            .inline_query
            .as_ref()
            .is_some_and(|q| q.query == query)
    })
}

/// Inline query text starts with `prefix`.
pub fn inline_query_prefix(prefix: impl Into<String>) -> Predicate {
    let prefix = prefix.into();
    Predicate::new(move |_, update| {
        update
            .inline_query
            .as_ref()
            .is_some_and(|q| q.query.starts_with(&prefix))
    })
}

// ============================================================================
// Chats
// ============================================================================

/// The message was sent in a chat of type `kind`.
pub fn message_chat_type(kind: ChatType) -> Predicate {
    Predicate::new(move |_, update| update.message.as_ref().is_some_and(|m| m.chat.kind == kind))
}

fn callback_data(update: &telex_core::Update) -> Option<&str> {
    update.callback_query.as_ref()?.data.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use telex_core::{CallbackQuery, InlineQuery, Update};

    use crate::test_util::{context, text_update};

    fn counting(result: bool, counter: &Arc<AtomicUsize>) -> Predicate {
        let counter = Arc::clone(counter);
        Predicate::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn callback_update(data: &str) -> Update {
        Update {
            update_id: 1,
            callback_query: Some(CallbackQuery {
                id: "q".into(),
                data: Some(data.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_combinators() {
        let ctx = context();
        let update = text_update(1, "hi");

        assert!(any().check(&ctx, &update));
        assert!(!none().check(&ctx, &update));
        assert!(and([any(), any()]).check(&ctx, &update));
        assert!(!and([any(), none()]).check(&ctx, &update));
        assert!(and([]).check(&ctx, &update));
        assert!(or([none(), any()]).check(&ctx, &update));
        assert!(!or([]).check(&ctx, &update));
        assert!(not(none()).check(&ctx, &update));
    }

    #[test]
    fn test_and_or_short_circuit() {
        let ctx = context();
        let update = text_update(1, "hi");
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(!and([none(), counting(true, &counter)]).check(&ctx, &update));
        assert!(or([any(), counting(false, &counter)]).check(&ctx, &update));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_kind_predicates() {
        let ctx = context();
        let message = text_update(1, "hi");
        let callback = callback_update("x");

        assert!(any_message().check(&ctx, &message));
        assert!(!any_message().check(&ctx, &callback));
        assert!(any_callback_query().check(&ctx, &callback));
        assert!(!any_callback_query_with_message().check(&ctx, &callback));
        assert!(!any_edited_message().check(&ctx, &message));
        assert!(!any_inline_query().check(&ctx, &message));
    }

    #[test]
    fn test_callback_data() {
        let ctx = context();
        let update = callback_update("vote:up");

        assert!(callback_data_equal("vote:up").check(&ctx, &update));
        assert!(callback_data_prefix("vote:").check(&ctx, &update));
        assert!(callback_data_contains(":u").check(&ctx, &update));
        assert!(!callback_data_equal("vote").check(&ctx, &update));
        assert!(!callback_data_prefix("vote:").check(&ctx, &text_update(1, "vote:up")));
    }

    #[test]
    fn test_inline_query() {
        let ctx = context();
        let update = Update {
            update_id: 2,
            inline_query: Some(InlineQuery {
                id: "i".into(),
                query: "gif cats".into(),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(inline_query_prefix("gif").check(&ctx, &update));
        assert!(inline_query_equal("gif cats").check(&ctx, &update));
        assert!(!inline_query_equal("gif").check(&ctx, &update));
    }

    #[test]
    fn test_message_chat_type() {
        let ctx = context();
        let update = text_update(1, "hi");

        assert!(message_chat_type(ChatType::Private).check(&ctx, &update));
        assert!(!message_chat_type(ChatType::Group).check(&ctx, &update));
    }
}
