//! Handler-level HTTP tests over a synthetic resource directory.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use clap::Parser;
use grf_format::VERSION_0X200;
use grf_format::testkit::GrfBuilder;
use grf_serve::config::ServerConfig;
use grf_serve::http::create_router;
use grf_serve::server::AppState;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn setup() -> (TempDir, Arc<AppState>, Router) {
    let dir = TempDir::new().unwrap();
    GrfBuilder::new(VERSION_0X200)
        .entry("data/a.txt", b"hello")
        .entry("data/texture/foo.bmp", b"BM-fake-bitmap")
        .entry("data/유저인터페이스/logo.bmp", b"BM-logo")
        .entry("secret/hidden.txt", b"not served")
        .write_to(&dir.path().join("base.grf"))
        .unwrap();
    std::fs::write(dir.path().join("data.ini"), "[Data]\n0=base.grf\n").unwrap();

    let config = ServerConfig::parse_from([
        "grf-serve",
        "--resource-path",
        dir.path().to_str().unwrap(),
    ]);
    let state = Arc::new(AppState::new(&config).unwrap());
    let router = create_router(Arc::clone(&state));
    (dir, state, router)
}

async fn get(router: &Router, uri: &str) -> axum::http::Response<Body> {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: axum::http::Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn percent_encode(path: &str) -> String {
    path.bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'-' | b'_') {
                char::from(b).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

#[tokio::test]
async fn serves_an_asset_with_mime_and_etag() {
    let (_dir, _state, router) = setup();

    let response = get(&router, "/data/a.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert!(response.headers().contains_key(header::ETAG));
    assert_eq!(body_bytes(response).await, b"hello");
}

#[tokio::test]
async fn if_none_match_returns_304() {
    let (_dir, _state, router) = setup();

    let first = get(&router, "/data/a.txt").await;
    let etag = first.headers()[header::ETAG].clone();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/data/a.txt")
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn stale_etag_gets_fresh_content() {
    let (_dir, _state, router) = setup();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/data/a.txt")
                .header(header::IF_NONE_MATCH, "\"0000\"")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"hello");
}

#[tokio::test]
async fn percent_encoded_paths_resolve() {
    let (_dir, _state, router) = setup();

    let uri = format!("/{}", percent_encode("data/유저인터페이스/logo.bmp"));
    let response = get(&router, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"BM-logo");
}

#[tokio::test]
async fn misses_are_404_and_recorded_once() {
    let (_dir, state, router) = setup();

    assert_eq!(get(&router, "/data/nope.txt").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/data/nope.txt").await.status(), StatusCode::NOT_FOUND);

    let missing = state.missing().stats();
    assert_eq!(missing.unique, 1);
    assert_eq!(missing.total, 2);
}

#[tokio::test]
async fn parent_components_never_escape_the_resource_dir() {
    // resource directory nested one level down, with a decoy file
    // directly above it that a traversing read would reach
    let dir = TempDir::new().unwrap();
    let resource = dir.path().join("res");
    std::fs::create_dir_all(&resource).unwrap();
    GrfBuilder::new(VERSION_0X200)
        .entry("data/a.txt", b"hello")
        .write_to(&resource.join("base.grf"))
        .unwrap();
    std::fs::write(resource.join("data.ini"), "[Data]\n0=base.grf\n").unwrap();
    std::fs::write(dir.path().join("outside.txt"), b"should never be served").unwrap();

    let config = ServerConfig::parse_from([
        "grf-serve",
        "--resource-path",
        resource.to_str().unwrap(),
    ]);
    let state = Arc::new(AppState::new(&config).unwrap());
    let router = create_router(state);

    for uri in [
        "/data/../outside.txt",
        "/data/%2e%2e/outside.txt",
        "/data/texture/../../outside.txt",
        "/data/../../../etc/passwd",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    // the asset itself still resolves
    let response = get(&router, "/data/a.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn paths_outside_the_whitelist_are_404() {
    let (_dir, state, router) = setup();

    let response = get(&router, "/secret/hidden.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    // whitelist rejections are not "missing files"
    assert_eq!(state.missing().stats().total, 0);
}

#[tokio::test]
async fn health_and_stats_endpoints() {
    let (_dir, _state, router) = setup();

    let response = get(&router, "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ok");

    let response = get(&router, "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(stats["storage"]["archives"], 1);
    assert!(stats["storage"]["indexed_keys"].as_u64().unwrap() >= 3);
}

#[tokio::test]
async fn search_endpoint_filters_by_regex() {
    let (_dir, _state, router) = setup();

    let response = get(&router, "/search?q=%5C.bmp%24").await;
    assert_eq!(response.status(), StatusCode::OK);
    let matches: Vec<String> = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(matches.contains(&"data/texture/foo.bmp".to_string()));

    let response = get(&router, "/search?q=%5Binvalid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
