use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::faq::DEFAULT_SIMILARITY_THRESHOLD;
use crate::widget::DEFAULT_GREETING;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the chat server (default)
    Serve,
    /// Chat with a running server from the terminal
    Chat {
        /// Chat endpoint URL
        #[arg(long, env = "CHAT_ENDPOINT")]
        endpoint: Option<String>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub faq: FaqConfig,
    pub escalation: EscalationConfig,
    pub widget: WidgetConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory holding `index.html` and the browser widget assets.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaqConfig {
    pub path: String,
    pub similarity_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EscalationConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub endpoint: String,
    pub min_reply_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub greeting: String,
}

impl WidgetConfig {
    pub fn min_reply_delay(&self) -> Duration {
        Duration::from_millis(self.min_reply_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layer defaults, config file, `UNIBOT_` environment and CLI flags,
    /// lowest priority first.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("faq.path", "data/faq.json")?
            .set_default("faq.similarity_threshold", DEFAULT_SIMILARITY_THRESHOLD)?
            .set_default("escalation.path", "escalated_queries.json")?
            .set_default("widget.endpoint", "http://127.0.0.1:3000/api/chat")?
            .set_default("widget.min_reply_delay_ms", 1000)?
            .set_default("widget.request_timeout_secs", 30)?
            .set_default("widget.greeting", DEFAULT_GREETING)?
            .set_default("resilience.timeout_disabled", false)?;

        // Explicit file must exist; otherwise ./config.{yaml,toml,json} if present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. UNIBOT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("UNIBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }
        if let Some(Command::Chat {
            endpoint: Some(endpoint),
        }) = &cli.command
        {
            builder = builder.set_override("widget.endpoint", endpoint.as_str())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
