//! HTTP request handlers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::server::AppState;

/// Handle GET /{*path}: resolve one asset from the overlay stack.
///
/// Returns 304 when the client's `If-None-Match` already names the
/// current content, 404 for both misses and paths outside the
/// whitelist.
pub async fn handle_asset(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let Some((data, mime)) = state.serve(&path) else {
        return Err(AppError::NotFound);
    };

    let etag = format!("\"{}\"", hex::encode(md5::compute(data.as_slice()).0));
    if client_has_version(&headers, &etag) {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::ETAG, etag),
        ],
        data.to_vec(),
    )
        .into_response())
}

fn client_has_version(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value == "*" || value.split(',').any(|candidate| candidate.trim() == etag)
        })
}

#[derive(Deserialize)]
pub struct SearchParams {
    q: String,
}

/// Handle GET /search?q={regex} over the index and local listing.
pub async fn handle_search(
    Query(params): Query<SearchParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let pattern = regex::Regex::new(&params.q)
        .map_err(|e| AppError::BadRequest(format!("invalid pattern: {e}")))?;
    Ok(Json(state.storage().search(&pattern)))
}

#[derive(Serialize)]
struct StatsResponse {
    uptime_seconds: u64,
    storage: grf_storage::StorageStats,
    missing: crate::missing::MissingStats,
}

/// Handle GET /stats: counters as JSON.
pub async fn handle_stats(State(state): State<Arc<AppState>>) -> Response {
    Json(StatsResponse {
        uptime_seconds: state.uptime_seconds(),
        storage: state.storage().stats(),
        missing: state.missing().stats(),
    })
    .into_response()
}

/// Handle GET /healthz.
pub async fn handle_healthz() -> &'static str {
    "ok"
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
        }
    }
}
