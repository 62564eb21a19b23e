mod render;
mod seed;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use switchboard_chats::{ChatClientHandle, ChatSnapshot, ChatSurfaceBinding};
use switchboard_config::load as load_config;
use switchboard_runtime::{telemetry, SurfaceServices};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::info;

#[derive(Parser)]
#[command(name = "switchboard-surface")]
#[command(about = "Switchboard chat surface (console by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session and print every rendered surface
    Demo,
    /// Start interactive console (default)
    Console {
        /// Chat to open first
        #[arg(long, default_value = seed::GENERAL)]
        chat: String,
        /// Seconds between simulated inbound messages, 0 disables the feed
        #[arg(long, default_value_t = 0)]
        feed_interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services =
        SurfaceServices::initialise(&config).context("failed to initialise surface services")?;

    match cli.command.unwrap_or(Commands::Console {
        chat: seed::GENERAL.to_string(),
        feed_interval: 0,
    }) {
        Commands::Demo => run_demo(&services),
        Commands::Console {
            chat,
            feed_interval,
        } => run_console(&services, &chat, feed_interval).await,
    }
}

/// Open `chat_id` on `binding`, loading sample data the first time.
fn open(services: &SurfaceServices, binding: &ChatSurfaceBinding, chat_id: &str) {
    binding.activate(chat_id);
    let client = services.registry.local_client(chat_id);
    seed::ensure_loaded(&client, chat_id, &services.session);
}

fn print_surface(services: &SurfaceServices, binding: &ChatSurfaceBinding) {
    print!("{}", render::paint(&binding.render(&services.sanitizer)));
}

fn run_demo(services: &SurfaceServices) -> anyhow::Result<()> {
    info!("running scripted demo");
    let binding = services.binding(None);

    println!("--- open {}", seed::GENERAL);
    open(services, &binding, seed::GENERAL);
    print_surface(services, &binding);

    println!("--- inbound message with unsupported markup");
    let general = services.registry.local_client(seed::GENERAL);
    general.receive_message(seed::inbound(
        "bob",
        "Bob Jones",
        "<p>check this</p><marquee>wheee</marquee>",
    ));
    print_surface(services, &binding);

    println!("--- send, then edit");
    let intents = binding.intents();
    intents.send_message("<p>on it</p>");
    let sent = last_message_id(&binding.current_state())
        .context("sent message missing from thread")?;
    binding.intents().update_message(sent, "<p>on it, <b>now</b></p>");
    print_surface(services, &binding);

    println!("--- switch to {}", seed::DIRECT);
    open(services, &binding, seed::DIRECT);
    print_surface(services, &binding);

    for chat_id in seed::CHAT_IDS {
        let listeners = services.registry.local_client(chat_id).listener_count();
        println!("{chat_id}: {listeners} listener(s)");
    }
    Ok(())
}

fn last_message_id(snapshot: &ChatSnapshot) -> Option<String> {
    snapshot
        .messages
        .last()
        .map(|message| message.message_id().to_string())
}

async fn run_console(
    services: &SurfaceServices,
    initial_chat: &str,
    feed_interval: u64,
) -> anyhow::Result<()> {
    info!("starting interactive console");

    let dirty = Arc::new(AtomicBool::new(false));
    let flag = dirty.clone();
    let binding = services.binding(Some(Arc::new(move |_snapshot: &Arc<ChatSnapshot>| {
        flag.store(true, Ordering::Release);
    })));

    println!("Switchboard Chat Surface");
    println!("Type a message to send it, or '/help' for commands");
    println!("Use Ctrl+C or '/quit' to exit");
    println!("---");

    open(services, &binding, initial_chat);
    print_surface(services, &binding);
    dirty.store(false, Ordering::Release);

    let mut lines = console_lines(tokio::io::stdin());
    let mut feed = tokio::time::interval(Duration::from_secs(feed_interval.max(1)));
    feed.tick().await;
    let mut fed = 0usize;

    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        tokio::select! {
            read = lines.next_line() => {
                let Some(line) = read? else {
                    break; // EOF
                };
                match handle_command(services, &binding, line.trim()) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Err(error) => println!("error: {error:#}"),
                }
            }
            _ = feed.tick(), if feed_interval > 0 => {
                if let Some(chat_id) = binding.active_chat_id() {
                    fed += 1;
                    println!();
                    services.registry.local_client(&chat_id).receive_message(seed::inbound(
                        "carol",
                        "Carol Smith",
                        format!("<p>ping #{fed}</p>"),
                    ));
                }
            }
            _ = switchboard_runtime::shutdown_signal() => break,
        }

        if dirty.swap(false, Ordering::AcqRel) {
            print_surface(services, &binding);
        }
    }

    binding.deactivate();
    Ok(())
}

/// Line reader for the console loop.
///
/// `next_line` keeps a partial line buffered when another `select!` branch
/// wins, so feed ticks never eat typed input.
fn console_lines<R: AsyncRead + Unpin>(input: R) -> Lines<BufReader<R>> {
    BufReader::new(input).lines()
}

enum Flow {
    Continue,
    Quit,
}

fn handle_command(
    services: &SurfaceServices,
    binding: &ChatSurfaceBinding,
    input: &str,
) -> anyhow::Result<Flow> {
    if input.is_empty() {
        return Ok(Flow::Continue);
    }
    if !input.starts_with('/') {
        binding.intents().send_message(input);
        return Ok(Flow::Continue);
    }

    let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
    let rest = rest.trim();
    let intents = binding.intents();

    match command {
        "/quit" | "/exit" | "/q" => return Ok(Flow::Quit),
        "/help" | "/h" => print_help(),
        "/send" | "/s" => intents.send_message(rest),
        "/edit" | "/e" => {
            let (prefix, content) = rest.split_once(' ').unwrap_or((rest, ""));
            let id = resolve_message_id(binding, prefix)?;
            intents.update_message(id, content.trim());
        }
        "/delete" | "/d" => {
            let id = resolve_message_id(binding, rest)?;
            intents.delete_message(id);
        }
        "/rename" | "/r" => intents.rename_chat(rest),
        "/add" | "/a" => intents.add_chat_members(rest.split_whitespace()),
        "/remove" | "/rm" => intents.remove_chat_member(rest),
        "/more" | "/m" => {
            let count = if rest.is_empty() {
                0
            } else {
                rest.parse().with_context(|| format!("not a number: {rest}"))?
            };
            intents.load_previous_chat_messages(count);
        }
        "/open" | "/o" => {
            if rest.is_empty() {
                bail!("usage: /open <chat id>");
            }
            open(services, binding, rest);
        }
        "/fail" => {
            let chat_id = active_chat(binding)?;
            let reason = if rest.is_empty() { "connection lost" } else { rest };
            services.registry.local_client(&chat_id).fail_session(reason);
        }
        "/dismiss" => {
            let chat_id = active_chat(binding)?;
            services.registry.local_client(&chat_id).clear_errors();
        }
        "/chats" => {
            for chat_id in seed::CHAT_IDS {
                let loaded = services
                    .registry
                    .get(chat_id)
                    .and_then(|client| client.current_state())
                    .is_some();
                println!("  {chat_id}{}", if loaded { " (loaded)" } else { "" });
            }
        }
        other => println!("Unknown command: {other}. Type /help for commands."),
    }

    Ok(Flow::Continue)
}

fn print_help() {
    println!("Available commands:");
    println!("  <text>                  - Send a message");
    println!("  /send, /s <text>        - Send a message");
    println!("  /edit, /e <id> <text>   - Edit one of your messages");
    println!("  /delete, /d <id>        - Delete one of your messages");
    println!("  /rename, /r <topic>     - Rename the chat");
    println!("  /add, /a <user>...      - Add members (group chats)");
    println!("  /remove, /rm <user>     - Remove a member (group chats)");
    println!("  /more, /m [count]       - Load older messages");
    println!("  /open, /o <chat id>     - Switch to another chat");
    println!("  /chats                  - List sample chats");
    println!("  /fail [reason]          - Simulate a lost session");
    println!("  /dismiss                - Clear the error bar");
    println!("  /help, /h               - Show this help");
    println!("  /quit, /exit, /q        - Exit console");
}

fn active_chat(binding: &ChatSurfaceBinding) -> anyhow::Result<String> {
    binding.active_chat_id().context("no chat is open")
}

/// Full id of the message whose id starts with `prefix`.
fn resolve_message_id(binding: &ChatSurfaceBinding, prefix: &str) -> anyhow::Result<String> {
    if prefix.is_empty() {
        bail!("a message id is required");
    }
    let snapshot = binding.current_state();
    let mut matches = snapshot
        .messages
        .iter()
        .map(|message| message.message_id())
        .filter(|id| id.starts_with(prefix));

    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id.to_string()),
        (Some(_), Some(_)) => bail!("message id prefix {prefix} is ambiguous"),
        (None, _) => bail!("no message with id {prefix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_partial_line_survives_interrupted_read() {
        let (mut typed, input) = tokio::io::duplex(64);
        let mut lines = console_lines(input);

        typed.write_all(b"/send hel").await.unwrap();
        tokio::select! {
            _ = lines.next_line() => panic!("line completed early"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }

        typed.write_all(b"lo\n").await.unwrap();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("/send hello")
        );
    }
}
