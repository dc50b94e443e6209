//! HTTP service answering questions about a chat history.
//!
//! ```text
//! POST /ask ──► AskHandler ──► AskEngine ──► embed ▸ retrieve ▸ assemble ▸ generate
//! ```

pub mod ask_handler;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod router;

use std::sync::Arc;

use anyhow::Context;
use askwhy_embeddings::EmbeddingProvider;
use askwhy_retrieval::{AskEngine, GenerationProvider};
use tokio::net::TcpListener;
use tracing::info;

pub use ask_handler::AskHandler;
pub use config::AppConfig;
pub use error::ApiError;
pub use router::router;

/// Build the engine described by `config` around the given providers.
pub fn build_engine(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
) -> anyhow::Result<Arc<AskEngine>> {
    let engine = AskEngine::builder()
        .with_config(config.retrieval.clone())
        .with_profile(config.profile.clone())
        .with_embedder(embedder)
        .with_generator(generator)
        .build()
        .context("Failed to create ask engine")?;
    Ok(Arc::new(engine))
}

/// Serve the API on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, engine: Arc<AskEngine>) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!("Listening on {addr}");

    let app = router(AskHandler::new(engine));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
