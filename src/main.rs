//! UniBot entry point.
//!
//! `unibot serve` runs the chat endpoint; `unibot chat` runs the widget
//! in the terminal against a running endpoint.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio::io::BufReader;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use unibot::client::HttpTransport;
use unibot::config::{AppConfig, Cli, Command};
use unibot::server;
use unibot::widget::{ChatWidget, TerminalView, run_repl};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Serve);

    // Keep the terminal transcript clean unless RUST_LOG asks otherwise.
    let default_level = match command {
        Command::Serve => "info",
        Command::Chat { .. } => "warn",
    };
    init_tracing(default_level, cli.log_json)?;

    let config = Arc::new(AppConfig::from_cli(&cli)?);

    match command {
        Command::Serve => server::start_server(config).await,
        Command::Chat { .. } => chat(&config).await,
    }
}

/// Initialize tracing (M-LOG-STRUCTURED).
fn init_tracing(default_level: &str, json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

async fn chat(config: &AppConfig) -> anyhow::Result<()> {
    let transport =
        HttpTransport::with_timeout(&config.widget.endpoint, config.widget.request_timeout())?;
    let widget = ChatWidget::new(transport, TerminalView::stdout())
        .with_min_reply_delay(config.widget.min_reply_delay())
        .with_greeting(config.widget.greeting.clone());

    println!("Type a question and press Enter. {} to exit.", unibot::widget::QUIT_COMMAND);
    run_repl(&widget, BufReader::new(tokio::io::stdin())).await?;
    Ok(())
}
