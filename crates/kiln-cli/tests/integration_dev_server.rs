//! Integration tests for the development server.
//!
//! Requests go straight through the router with `tower::ServiceExt`, so no
//! port is bound.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use kiln_cli::dev::{AssetCache, DevRunner, DevServerState, SharedState, router};
use kiln_config::{DevServerConfig, KilnConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn state_with(dev: DevServerConfig) -> SharedState {
    Arc::new(DevServerState::new(dev))
}

async fn get(state: &SharedState, base: &Path, uri: &str, accept: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(accept) = accept {
        request = request.header(header::ACCEPT, accept);
    }
    router(state.clone(), base)
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn succeed_with(state: &SharedState, url: &str, content: &str) {
    let (generation, _) = state.begin_build();
    let mut cache = AssetCache::new();
    cache.insert(
        url.to_string(),
        content.as_bytes().to_vec(),
        "application/javascript; charset=utf-8",
    );
    assert!(state.complete_build(generation, cache, 3));
}

fn fail_with(state: &SharedState, errors: &[&str]) {
    let (generation, _) = state.begin_build();
    let errors = errors.iter().map(|e| e.to_string()).collect();
    assert!(state.fail_build(generation, errors, None));
}

#[tokio::test]
async fn serves_cached_artifacts_under_public_path() {
    let base = TempDir::new().unwrap();
    let state = state_with(DevServerConfig::default());
    succeed_with(&state, "/public/js/app.js", "app();");

    let response = get(&state, base.path(), "/public/js/app.js", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript; charset=utf-8"
    );
    assert_eq!(response.headers()["x-kiln-build-status"], "ok");
    assert_eq!(body_text(response).await, "app();");
}

#[tokio::test]
async fn applies_configured_headers_to_every_response() {
    let base = TempDir::new().unwrap();
    fs::write(base.path().join("index.html"), "<html></html>").unwrap();

    let mut dev = DevServerConfig::default();
    dev.headers
        .insert("Access-Control-Allow-Origin".into(), "*".into());
    let state = state_with(dev);

    let response = get(&state, base.path(), "/index.html", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["x-kiln-build-status"], "pending");
    assert_eq!(body_text(response).await, "<html></html>");

    let missing = get(&state, base.path(), "/nope.js", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn failed_build_shows_overlay_for_html_requests() {
    let base = TempDir::new().unwrap();
    let state = state_with(DevServerConfig::default());
    fail_with(&state, &["command failed for src/Main.elm: <type mismatch>"]);

    let response = get(&state, base.path(), "/", Some("text/html")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-kiln-build-status"], "failed");
    let html = body_text(response).await;
    assert!(html.contains("src/Main.elm"));
    assert!(html.contains("&lt;type mismatch&gt;"));
    assert!(html.contains("/__kiln/reload.js"));
}

#[tokio::test]
async fn failed_build_keeps_serving_previous_artifacts_with_overlay() {
    let base = TempDir::new().unwrap();
    let state = state_with(DevServerConfig::default());
    succeed_with(&state, "/public/js/app.js", "good();");
    fail_with(&state, &["broken"]);

    let response = get(&state, base.path(), "/public/js/app.js", Some("*/*")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "good();");
}

#[tokio::test]
async fn failed_build_without_overlay_returns_503_for_bundles() {
    let base = TempDir::new().unwrap();
    fs::write(base.path().join("index.html"), "<html></html>").unwrap();
    let state = state_with(DevServerConfig {
        overlay: false,
        ..Default::default()
    });
    fail_with(&state, &["first", "second"]);

    let bundle = get(&state, base.path(), "/public/js/app.js", None).await;
    assert_eq!(bundle.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(bundle).await, "first\nsecond");

    let page = get(&state, base.path(), "/index.html", Some("text/html")).await;
    assert_eq!(page.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_endpoint_reports_errors() {
    let base = TempDir::new().unwrap();
    let state = state_with(DevServerConfig::default());
    fail_with(&state, &["boom"]);

    let response = get(&state, base.path(), "/__kiln/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "failed");
    assert_eq!(body["generation"], 1);
    assert_eq!(body["errors"][0], "boom");
}

#[tokio::test]
async fn reload_script_is_served() {
    let base = TempDir::new().unwrap();
    let state = state_with(DevServerConfig::default());

    let response = get(&state, base.path(), "/__kiln/reload.js", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/javascript")
    );
    assert!(body_text(response).await.contains("EventSource"));
}

#[tokio::test]
async fn superseded_build_result_is_discarded() {
    let state = state_with(DevServerConfig::default());
    let (stale, stale_token) = state.begin_build();
    let (current, _) = state.begin_build();

    assert!(stale_token.is_cancelled());

    let mut cache = AssetCache::new();
    cache.insert("/public/js/app.js".into(), b"stale".to_vec(), "application/javascript");
    assert!(!state.complete_build(stale, cache, 1));
    assert!(state.cached("/public/js/app.js").is_none());

    assert!(state.complete_build(current, AssetCache::new(), 2));
    assert_eq!(state.status().as_str(), "ok");
}

#[tokio::test]
async fn runner_builds_project_into_memory() {
    let project = TempDir::new().unwrap();
    fs::create_dir_all(project.path().join("js")).unwrap();
    fs::write(project.path().join("js/app.js"), "app();\n").unwrap();

    let config = KilnConfig {
        explicit_entries: vec!["js/app.js".into()],
        ..Default::default()
    };
    let state = state_with(DevServerConfig::default());
    let (_id, mut events) = state.register_client();

    DevRunner::new(config, project.path(), false)
        .rebuild(&state)
        .await
        .unwrap();

    let started = events.recv().await.unwrap();
    assert!(started.contains("BuildStarted"));
    let completed = events.recv().await.unwrap();
    assert!(completed.contains("BuildCompleted"));

    let response = get(&state, project.path(), "/public/js/app.js", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("app();"));
    assert!(!project.path().join("public").exists());
}
