//! HTTP router assembly.

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::server::AppState;

pub mod handlers;

/// Build the router: fixed endpoints first, then the asset wildcard.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::handle_healthz))
        .route("/stats", get(handlers::handle_stats))
        .route("/search", get(handlers::handle_search))
        .route("/{*path}", get(handlers::handle_asset))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
