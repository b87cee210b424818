//! Planner server - HTTP API for goal decomposition and goal history.

mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use planner::agents::planner::RemotePlanner;
use planner::io::config::load_config;
use planner::io::llm::{ChatCompletionsClient, LlmClient};
use planner::io::store::open_store;

use crate::state::AppState;

/// Front-end files shipped with this crate.
const DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[derive(Parser)]
#[command(name = "planner-server")]
#[command(about = "Break goals into task plans and keep a goal history")]
struct Args {
    /// Address to bind the server to
    #[arg(long, env = "PLANNER_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Planner config file (TOML); defaults apply when missing
    #[arg(long, env = "PLANNER_CONFIG", default_value = "planner.toml")]
    config: PathBuf,

    /// Directory containing index.html and other front-end files
    #[arg(long, env = "PLANNER_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    /// Override the store database path from the config file
    #[arg(long, env = "PLANNER_STORE_PATH")]
    store_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    planner::logging::init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(path) = args.store_path {
        config.store.path = path;
    }
    config.validate()?;

    let store = open_store(&config.store).context("open store")?;
    info!(backend = ?config.store.backend, path = %config.store.path.display(), "store ready");

    let client = ChatCompletionsClient::from_config(&config.llm).context("build LLM client")?;
    let client: Option<Arc<dyn LlmClient>> = match client {
        Some(client) => {
            info!(model = %config.llm.model, "LLM client initialized");
            Some(Arc::new(client))
        }
        None => {
            warn!(
                env = %config.llm.api_key_env,
                "LLM api key not set, all plans will use the local fallback"
            );
            None
        }
    };

    let state = AppState::new(RemotePlanner::new(client), store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    if !args.static_dir.exists() {
        info!(static_dir = %args.static_dir.display(), "static directory not found, API-only mode");
    }
    let app = routes::app_router(&args.static_dir)
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
