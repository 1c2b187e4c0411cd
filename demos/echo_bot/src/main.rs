//! Echo Bot Example
//!
//! Demonstrates the handler tree, middlewares and `Context::next`:
//!
//! ```text
//! root   [log_updates, panic_recovery, timeout]
//! ├── [any_command] group   [number_commands]
//! │   ├── /start, /help
//! │   ├── /ping
//! │   ├── /echo <text>
//! │   ├── /info
//! │   └── [group chat] group
//! │       └── /group
//! ├── [callback data "echo:*"]  on_button
//! └── [any text]                echo_text
//! ```
//!
//! An unknown command matches the command group but none of its routes, so
//! the search falls through to `echo_text`.
//!
//! # Usage
//!
//! ```bash
//! TELEX_BOT__TOKEN=123456:ABC... cargo run --package echo-bot
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use telex::prelude::*;
use tracing::info;

const HELP: &str = "\
Echo Bot - Commands
/echo <text> - Echo text
/ping        - Pong!
/help        - This help
/info        - Message info
/group       - Group only";

/// Sequence number of a command, set by [`number_commands`].
#[derive(Debug, Clone, Copy)]
struct CommandNumber(u64);

static COMMANDS_SEEN: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// Middlewares
// ============================================================================

/// Numbers every command and stores the number in the update state.
async fn number_commands(ctx: Context, update: Update) -> HandlerResult {
    let number = COMMANDS_SEEN.fetch_add(1, Ordering::Relaxed) + 1;
    ctx.set_state(CommandNumber(number));
    ctx.next(update).await
}

// ============================================================================
// Handlers
// ============================================================================

async fn reply(ctx: &Context, message: &Message, text: impl Into<String>) -> HandlerResult {
    ctx.bot()
        .send_message(&SendMessageParams::new(message.chat.id, text).reply_to(message.message_id))
        .await?;
    Ok(())
}

async fn help(ctx: Context, message: Message) -> HandlerResult {
    reply(&ctx, &message, HELP).await
}

async fn ping(ctx: Context, message: Message) -> HandlerResult {
    reply(&ctx, &message, "Pong!").await
}

async fn echo_command(ctx: Context, message: Message) -> HandlerResult {
    let args = message
        .text
        .as_deref()
        .and_then(parse_command)
        .map(|cmd| cmd.args.join(" "))
        .unwrap_or_default();

    if args.is_empty() {
        return reply(&ctx, &message, "Usage: /echo <text>").await;
    }
    reply(&ctx, &message, args).await
}

async fn message_info(ctx: Context, message: Message) -> HandlerResult {
    let number = ctx.get_state::<CommandNumber>().map_or(0, |n| n.0);
    let from = message
        .from
        .as_ref()
        .map(|u| format!("{} ({})", u.first_name, u.id))
        .unwrap_or_else(|| "unknown".to_string());

    let text = format!(
        "Message Info\n\
        • Chat: {} ({:?})\n\
        • From: {}\n\
        • Message ID: {}\n\
        • Command #{}",
        message.chat.id, message.chat.kind, from, message.message_id, number
    );
    reply(&ctx, &message, text).await
}

async fn group_only(ctx: Context, message: Message) -> HandlerResult {
    let title = message.chat.title.clone().unwrap_or_default();
    reply(&ctx, &message, format!("This is a group-only command in {title}")).await
}

async fn on_button(ctx: Context, query: CallbackQuery) -> HandlerResult {
    let text = query
        .data
        .as_deref()
        .and_then(|d| d.strip_prefix("echo:"))
        .unwrap_or_default()
        .to_string();

    ctx.bot()
        .answer_callback_query(&AnswerCallbackQueryParams::new(query.id).with_text(text))
        .await?;
    Ok(())
}

async fn echo_text(ctx: Context, message: Message) -> HandlerResult {
    let Some(text) = message.text.clone() else {
        return Ok(());
    };
    info!(chat_id = message.chat.id, "Echoing text");
    reply(&ctx, &message, text).await
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // telex.toml in the working directory, then TELEX_* variables
    let mut runtime = TelexRuntime::builder().build()?;

    let root = runtime.handlers_mut();
    root.use_middlewares([
        middleware::log_updates(),
        middleware::panic_recovery(),
        middleware::timeout(Duration::from_secs(30)),
    ]);

    let commands = root.group([any_command()]);
    commands
        .use_middleware(number_commands)
        .handle_message(help, [or([command_equal("start"), command_equal("help")])])
        .handle_message(ping, [command_equal("ping")])
        .handle_message(echo_command, [command_equal("echo")])
        .handle_message(message_info, [command_equal("info")]);
    commands
        .group([or([
            message_chat_type(ChatType::Group),
            message_chat_type(ChatType::Supergroup),
        ])])
        .handle_message(group_only, [command_equal("group")]);

    root.handle_callback_query(on_button, [callback_data_prefix("echo:")])
        .handle_message(echo_text, [any_message_with_text()]);

    runtime.run().await?;
    Ok(())
}
