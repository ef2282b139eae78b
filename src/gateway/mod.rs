//! HTTP/WebSocket gateway (Axum) for the search pipeline.
//!
//! This module is primarily used by the `verse-search` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handler::{SessionReply, handle_session_message, semantic_search_handler, session_handler};
pub use state::HandlerState;

use crate::store::SearchBackend;

pub fn create_router_with_state<B>(state: HandlerState<B>) -> Router
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/supported-bible-versions", get(supported_versions_handler))
        .route("/semantic-search", post(semantic_search_handler))
        .route("/ws/semantic-search", get(session_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Static liveness indicator; touches no dependencies.
#[tracing::instrument]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Serves the registry's current corpus list.
#[tracing::instrument(skip(state))]
pub async fn supported_versions_handler<B>(
    State(state): State<HandlerState<B>>,
) -> Json<Vec<String>>
where
    B: SearchBackend + Clone + Send + Sync + 'static,
{
    Json(state.registry.supported().await)
}
