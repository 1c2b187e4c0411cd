//! Message text predicates.

use regex_lite::Regex;
use telex_core::Update;

use crate::predicate::Predicate;

fn message_text(update: &Update) -> Option<&str> {
    update.message.as_ref()?.text.as_deref()
}

/// A message that has text.
pub fn any_message_with_text() -> Predicate {
    Predicate::new(|_, update| message_text(update).is_some())
}

/// Message text equals `text` exactly.
pub fn text_equal(text: impl Into<String>) -> Predicate {
    let text = text.into();
    Predicate::new(move |_, update| message_text(update) == Some(text.as_str()))
}

/// Message text equals `text`, ignoring case.
pub fn text_equal_fold(text: impl Into<String>) -> Predicate {
    let text = text.into().to_lowercase();
    Predicate::new(move |_, update| message_text(update).is_some_and(|t| t.to_lowercase() == text))
}

pub fn text_prefix(prefix: impl Into<String>) -> Predicate {
    let prefix = prefix.into();
    Predicate::new(move |_, update| message_text(update).is_some_and(|t| t.starts_with(&prefix)))
}

pub fn text_suffix(suffix: impl Into<String>) -> Predicate {
    let suffix = suffix.into();
    Predicate::new(move |_, update| message_text(update).is_some_and(|t| t.ends_with(&suffix)))
}

pub fn text_contains(needle: impl Into<String>) -> Predicate {
    let needle = needle.into();
    Predicate::new(move |_, update| message_text(update).is_some_and(|t| t.contains(&needle)))
}

/// Message text matches `pattern` anywhere. Anchor it for a full match.
pub fn text_matches(pattern: Regex) -> Predicate {
    Predicate::new(move |_, update| message_text(update).is_some_and(|t| pattern.is_match(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{context, text_update};

    #[test]
    fn test_text_predicates() {
        let ctx = context();
        let update = text_update(1, "Hello World");

        assert!(any_message_with_text().check(&ctx, &update));
        assert!(text_equal("Hello World").check(&ctx, &update));
        assert!(!text_equal("hello world").check(&ctx, &update));
        assert!(text_equal_fold("hello world").check(&ctx, &update));
        assert!(text_prefix("Hello").check(&ctx, &update));
        assert!(text_suffix("World").check(&ctx, &update));
        assert!(text_contains("o W").check(&ctx, &update));
        assert!(!text_contains("xyz").check(&ctx, &update));
    }

    #[test]
    fn test_text_matches() {
        let ctx = context();
        let pattern = Regex::new(r"^\d{3}-\d{4}$").unwrap();

        assert!(text_matches(pattern.clone()).check(&ctx, &text_update(1, "555-1234")));
        assert!(!text_matches(pattern).check(&ctx, &text_update(2, "call 555-1234")));
    }

    #[test]
    fn test_no_text_never_matches() {
        let ctx = context();
        let update = Update {
            update_id: 1,
            ..Default::default()
        };

        assert!(!any_message_with_text().check(&ctx, &update));
        assert!(!text_equal("").check(&ctx, &update));
        assert!(!text_prefix("").check(&ctx, &update));
    }
}
