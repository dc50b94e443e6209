use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use askwhy_app_server::config::DEFAULT_CONFIG_PATH;
use askwhy_app_server::{AppConfig, build_engine, logging, serve};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

/// Answer questions about a chat history.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "ASKWHY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set, e.g. `debug`.
    #[arg(long)]
    log_level: Option<String>,

    /// Address to bind, overriding `[server] bind`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    let config = AppConfig::load(&cli.config)?;
    let embedder = Arc::new(config.embedding.provider()?);
    let generator = Arc::new(config.generation.provider()?);
    let engine = build_engine(&config, embedder, generator)?;

    let state = engine.initialize().await;
    info!("Vector store initialized: {state:?}");

    let bind_addr = cli.bind.unwrap_or(config.server.bind);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;

    serve(listener, engine).await
}
