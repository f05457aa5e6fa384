//! Memory Assistant - Gemini chat with user memory
//!
//! `serve` runs the stateless gateway that forwards a conversation to Gemini
//! together with the memory function declarations. `chat` runs a terminal
//! client that owns one session and executes the memory functions locally.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod conversation;
mod core;
mod plugins;
mod providers;
mod routes;
mod terminal;

use config::{ClientConfig, Config};
use core::{HttpGateway, Session};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

#[derive(Debug, Parser)]
#[command(name = "memory-assistant", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the model gateway (default)
    Serve,

    /// Chat in the terminal through a deployed gateway
    Chat {
        /// Full proxy URL, e.g. https://your-project.vercel.app/api/proxy
        #[arg(long, env = "GATEWAY_URL")]
        gateway_url: Option<String>,

        /// Client configuration file (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve() -> anyhow::Result<()> {
    init_tracing("memory_assistant=debug,tower_http=debug");

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; every proxy request will fail until it is configured");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream_timeout_secs))
        .build()?;

    tracing::info!(model = %config.model, "Forwarding to Gemini");

    let state = AppState { config, http };

    let app = Router::new()
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Memory assistant gateway running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn chat(gateway_url: Option<String>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    init_tracing("memory_assistant=warn");

    let client_config = match config_path {
        Some(path) => ClientConfig::from_file(&path)?,
        None => ClientConfig::default(),
    };

    let url = gateway_url
        .or_else(|| client_config.gateway.url.clone())
        .ok_or_else(|| anyhow::anyhow!("No gateway URL: pass --gateway-url, set GATEWAY_URL or gateway.url in the config file"))?;

    let gateway = HttpGateway::new(url, Duration::from_secs(client_config.gateway.timeout_secs))?;
    let session = Session::new(gateway, &client_config.session);

    terminal::run(session).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Chat {
            gateway_url,
            config,
        } => chat(gateway_url, config).await,
    }
}
