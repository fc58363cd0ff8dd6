//! HTTP surface: WebSocket endpoint, index page, static assets

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;
use crate::ws;

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/", get(serve_index))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the configured index page at `/`
pub async fn serve_index(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(&state.config.index_file).await {
        Ok(content) => Html(content).into_response(),
        Err(e) => {
            tracing::warn!(path = %state.config.index_file.display(), "Index page unavailable: {}", e);
            (StatusCode::NOT_FOUND, "Index page not found").into_response()
        }
    }
}

/// Serve the chat relay on an already-bound listener until it fails
pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}
