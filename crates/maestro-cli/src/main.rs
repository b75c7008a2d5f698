//! Maestro CLI - terminal chat with the orchestrator agent.
//!
//! This is the entry point for the `maestro` binary.

mod render;

use std::io::{self, Write};

use clap::Parser;
use maestro_client::{AgentClient, Chat, ClientConfig};
use maestro_core::{ConversationState, DEFAULT_GREETING};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use render::TerminalRenderer;

/// Maestro CLI - terminal chat with the orchestrator agent.
#[derive(Parser, Debug)]
#[command(name = "maestro")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Agent service URL.
    #[arg(long, env = "MAESTRO_BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Agent application name.
    #[arg(long, env = "MAESTRO_APP_NAME", default_value = "orchestrator_agent")]
    app_name: String,

    /// User identifier sent with every request.
    #[arg(long, env = "MAESTRO_USER_ID", default_value = "web_user")]
    user_id: String,

    /// Replace the opening greeting.
    #[arg(long, conflicts_with = "no_greeting")]
    greeting: Option<String>,

    /// Start without an opening greeting.
    #[arg(long, default_value = "false")]
    no_greeting: bool,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug {
        EnvFilter::new("maestro=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Create client
    let config = ClientConfig {
        base_url: args.base_url,
        app_name: args.app_name,
        user_id: args.user_id,
        ..ClientConfig::default()
    };
    let client = AgentClient::new(config)?;

    let state = if args.no_greeting {
        ConversationState::new()
    } else {
        ConversationState::with_greeting(
            args.greeting.unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        )
    };

    let mut chat = Chat::new(client, state);
    let mut renderer = TerminalRenderer::new(io::stdout());

    println!("Maestro - type a message and press Enter. Type 'exit' to quit.");
    println!();

    if chat.start(&mut renderer).await.is_degraded() {
        eprintln!("warning: could not create a session, continuing with a local session ID");
    }

    // Read lines until EOF or an exit command
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match classify_line(&line) {
            Input::Blank => {}
            Input::Exit => break,
            Input::Message(text) => {
                chat.submit(text, &mut renderer).await;
            }
        }
    }

    tracing::debug!(messages = chat.state().messages().len(), "Exiting");
    Ok(())
}

/// What a line read from the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Blank,
    Exit,
    /// Submit the line exactly as typed.
    Message(&'a str),
}

fn classify_line(line: &str) -> Input<'_> {
    let command = line.trim();
    if command.is_empty() {
        Input::Blank
    } else if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else {
        Input::Message(line)
    }
}
