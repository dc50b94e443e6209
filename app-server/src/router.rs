use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ask_handler::AskHandler;
use crate::error::ApiError;
use crate::protocol::{
    AppendMessageParams, AppendMessageResponse, AskParams, AskResponse, HealthResponse,
    QueryParams, QueryResponse, RebuildResponse, StatusResponse,
};

pub const SERVICE_NAME: &str = "askwhy";

/// Creates the application router with all routes and middleware.
pub fn router(handler: AskHandler) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/query", post(query))
        .route("/rebuild", post(rebuild))
        .route("/messages", post(append_message))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

async fn health(State(handler): State<AskHandler>) -> Json<HealthResponse> {
    Json(handler.health().await)
}

async fn ask(
    State(handler): State<AskHandler>,
    Json(params): Json<AskParams>,
) -> Result<Json<AskResponse>, ApiError> {
    Ok(Json(handler.ask(params).await?))
}

async fn query(
    State(handler): State<AskHandler>,
    Json(params): Json<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    Ok(Json(handler.query(params).await?))
}

async fn rebuild(State(handler): State<AskHandler>) -> Result<Json<RebuildResponse>, ApiError> {
    Ok(Json(handler.rebuild().await?))
}

async fn append_message(
    State(handler): State<AskHandler>,
    Json(params): Json<AppendMessageParams>,
) -> Result<Json<AppendMessageResponse>, ApiError> {
    Ok(Json(handler.append_message(params).await?))
}
