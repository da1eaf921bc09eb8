//! HTTP side of the development server.
//!
//! Serves cached build artifacts under the public path, everything else from
//! the content base, and pushes build events to browsers over SSE.

use crate::dev::{SharedState, error_overlay};
use crate::error::{CliError, Result};
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use serde::Serialize;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::services::ServeDir;

pub const EVENTS_PATH: &str = "/__kiln/events";
pub const RELOAD_SCRIPT_PATH: &str = "/__kiln/reload.js";
pub const STATUS_PATH: &str = "/__kiln/status";

/// Response header carrying the state of the last build.
pub const BUILD_STATUS_HEADER: &str = "x-kiln-build-status";

const INTERNAL_PREFIX: &str = "/__kiln/";
const RELOAD_SCRIPT: &str = include_str!("../../assets/dev/reload-client.js");

pub struct DevServer {
    state: SharedState,
    content_base: PathBuf,
}

impl DevServer {
    pub fn new(state: SharedState, content_base: impl Into<PathBuf>) -> Self {
        Self {
            state,
            content_base: content_base.into(),
        }
    }

    /// `host:port` from the dev server configuration.
    pub fn address(&self) -> String {
        let dev = self.state.dev_config();
        format!("{}:{}", dev.host, dev.port)
    }

    /// Bind and serve until the task is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Server`] if the address cannot be bound or the
    /// server stops with an error.
    pub async fn start(self) -> Result<()> {
        let addr = self.address();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CliError::Server(format!("failed to bind to {addr}: {e}")))?;

        crate::ui::success(&format!("Development server running at http://{addr}"));
        tracing::debug!(content_base = %self.content_base.display(), "serving static files");

        let app = router(self.state, &self.content_base);
        axum::serve(listener, app)
            .await
            .map_err(|e| CliError::Server(format!("server error: {e}")))
    }
}

/// Router for the dev server.
///
/// Request handling, outermost first:
/// 1. configured headers and `X-Kiln-Build-Status` on every response
/// 2. build output: error overlay or 503 while failing, otherwise cached
///    artifacts
/// 3. the `/__kiln/` endpoints
/// 4. static files from `content_base`
pub fn router(state: SharedState, content_base: &Path) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(handle_events))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .route(STATUS_PATH, get(handle_status))
        .fallback_service(ServeDir::new(content_base))
        .layer(middleware::from_fn_with_state(state.clone(), serve_artifacts))
        .layer(middleware::from_fn_with_state(state.clone(), inject_headers))
        .with_state(state)
}

async fn handle_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "live reload client connected");

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    generation: u64,
    errors: Vec<String>,
    assets: Vec<String>,
}

async fn handle_status(State(state): State<SharedState>) -> Json<StatusBody> {
    let status = state.status();
    Json(StatusBody {
        status: status.as_str(),
        generation: state.generation(),
        errors: status.errors().map(<[String]>::to_vec).unwrap_or_default(),
        assets: state.cached_urls(),
    })
}

async fn serve_artifacts(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with(INTERNAL_PREFIX) {
        return next.run(request).await;
    }

    let status = state.status();
    if let Some(errors) = status.errors() {
        if state.dev_config().overlay {
            if accepts_html(request.headers()) {
                return (
                    [(header::CACHE_CONTROL, "no-cache")],
                    Html(error_overlay::render_overlay(errors)),
                )
                    .into_response();
            }
        } else if state.is_bundle_request(&path) {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                errors.join("\n"),
            )
                .into_response();
        }
    }

    match state.cached(&path) {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            asset.content,
        )
            .into_response(),
        None => next.run(request).await,
    }
}

async fn inject_headers(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in state.headers() {
        headers.insert(name.clone(), value.clone());
    }
    headers.insert(
        HeaderName::from_static(BUILD_STATUS_HEADER),
        HeaderValue::from_static(state.status().as_str()),
    );
    response
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
