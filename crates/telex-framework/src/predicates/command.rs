//! Bot command predicates.
//!
//! A command is message text of the form `/name[@bot] [args...]`: a slash,
//! a name of letters, digits and underscores, an optional `@` mention of the
//! bot, then whitespace-separated arguments.

use telex_core::Update;

use crate::predicate::Predicate;

/// The parts of a bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Command name without the slash.
    pub name: &'a str,
    /// The bot username after `@`, if present.
    pub mention: Option<&'a str>,
    /// Whitespace-separated arguments.
    pub args: Vec<&'a str>,
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses `text` as a bot command.
///
/// ```
/// use telex_framework::predicates::parse_command;
///
/// let cmd = parse_command("/start@my_bot deep link").unwrap();
/// assert_eq!(cmd.name, "start");
/// assert_eq!(cmd.mention, Some("my_bot"));
/// assert_eq!(cmd.args, ["deep", "link"]);
/// ```
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.strip_prefix('/')?;
    let (head, tail) = match rest.find(char::is_whitespace) {
        Some(at) => rest.split_at(at),
        None => (rest, ""),
    };
    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };
    if !is_word(name) || mention.is_some_and(|m| !is_word(m)) {
        return None;
    }

    Some(ParsedCommand {
        name,
        mention,
        args: tail.split_whitespace().collect(),
    })
}

fn command(update: &Update) -> Option<ParsedCommand<'_>> {
    parse_command(update.message.as_ref()?.text.as_deref()?)
}

/// Any message that is a bot command.
pub fn any_command() -> Predicate {
    Predicate::new(|_, update| command(update).is_some())
}

/// A command named `name`, compared case-insensitively.
pub fn command_equal(name: impl Into<String>) -> Predicate {
    let name = name.into();
    Predicate::new(move |_, update| command(update).is_some_and(|c| c.name.eq_ignore_ascii_case(&name)))
}

/// A command named `name` with exactly `argc` arguments.
pub fn command_equal_argc(name: impl Into<String>, argc: usize) -> Predicate {
    let name = name.into();
    Predicate::new(move |_, update| {
        command(update).is_some_and(|c| c.name.eq_ignore_ascii_case(&name) && c.args.len() == argc)
    })
}

/// A command named `name` with exactly the arguments `argv`.
pub fn command_equal_argv<I, S>(name: impl Into<String>, argv: I) -> Predicate
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let name = name.into();
    let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
    Predicate::new(move |_, update| {
        command(update).is_some_and(|c| c.name.eq_ignore_ascii_case(&name) && c.args == argv)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{context, text_update};

    #[test]
    fn test_parse_command() {
        let cmd = parse_command("/help").unwrap();
        assert_eq!(cmd.name, "help");
        assert_eq!(cmd.mention, None);
        assert!(cmd.args.is_empty());

        let cmd = parse_command("/ban@mod_bot  alice \n 7d").unwrap();
        assert_eq!(cmd.name, "ban");
        assert_eq!(cmd.mention, Some("mod_bot"));
        assert_eq!(cmd.args, ["alice", "7d"]);
    }

    #[test]
    fn test_parse_rejects_non_commands() {
        assert!(parse_command("help").is_none());
        assert!(parse_command("/").is_none());
        assert!(parse_command("/ start").is_none());
        assert!(parse_command("/sta-rt").is_none());
        assert!(parse_command("/start@").is_none());
    }

    #[test]
    fn test_command_predicates() {
        let ctx = context();
        let update = text_update(1, "/Echo one two");

        assert!(any_command().check(&ctx, &update));
        assert!(command_equal("echo").check(&ctx, &update));
        assert!(!command_equal("ech").check(&ctx, &update));
        assert!(command_equal_argc("echo", 2).check(&ctx, &update));
        assert!(!command_equal_argc("echo", 1).check(&ctx, &update));
        assert!(command_equal_argv("echo", ["one", "two"]).check(&ctx, &update));
        assert!(!command_equal_argv("echo", ["two", "one"]).check(&ctx, &update));
        assert!(!any_command().check(&ctx, &text_update(2, "plain text")));
    }
}
