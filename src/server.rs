//! HTTP surface of the log server.
//!
//! `POST /api/log` appends client lines, `GET /logs` shows them as a page,
//! `GET /api/logs/raw` downloads the file and `GET /health` is a liveness check.
//! Unmatched paths fall through to the optional static directory.

use crate::error::IngestError;
use crate::ingest;
use crate::log_store::LogStore;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

const PAGE_STYLE: &str = "\
      body { font-family: monospace; margin: 20px; background: #111; color: #0f0; }
      pre { white-space: pre-wrap; word-wrap: break-word; }
      h1 { color: #fff; }
      a { color: #0af; }";

pub fn router(store: Arc<LogStore>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/api/log", post(ingest_logs))
        .route("/logs", get(view_logs))
        .route("/api/logs/raw", get(raw_logs))
        .route("/health", get(health))
        .with_state(store);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(CorsLayer::permissive())
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IngestError::MissingMessage => (StatusCode::BAD_REQUEST, "Missing message"),
            IngestError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            IngestError::Storage(e) => {
                error!("Error writing log: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn ingest_logs(
    State(store): State<Arc<LogStore>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, IngestError> {
    debug!("Received log request: {}", String::from_utf8_lossy(&body));

    let lines = ingest::lines_from_body(&body)?;
    store.append(&lines).await?;

    Ok(Json(json!({ "success": true })))
}

async fn view_logs(State(store): State<Arc<LogStore>>) -> Response {
    match store.read_to_string().await {
        Ok(Some(content)) => Html(render_log_page(&content)).into_response(),
        Ok(None) => Html(render_empty_page()).into_response(),
        Err(e) => {
            error!("Error reading logs: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

async fn raw_logs(State(store): State<Arc<LogStore>>) -> Response {
    match store.read_bytes().await {
        Ok(Some(bytes)) => (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"logs.txt\""),
            ],
            bytes,
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Log file not found").into_response(),
        Err(e) => {
            error!("Error serving raw log: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn render_empty_page() -> String {
    format!(
        "<!DOCTYPE html>
<html>
  <head>
    <title>Logs</title>
    <meta charset=\"utf-8\">
    <style>
{PAGE_STYLE}
    </style>
  </head>
  <body>
    <h1>Logs</h1>
    <p>No logs yet.</p>
  </body>
</html>
"
    )
}

fn render_log_page(content: &str) -> String {
    let escaped = escape_html(content);
    format!(
        "<!DOCTYPE html>
<html>
  <head>
    <title>Logs</title>
    <meta charset=\"utf-8\">
    <style>
{PAGE_STYLE}
    </style>
  </head>
  <body>
    <h1>Logs</h1>
    <p><a href=\"/api/logs/raw\">Download raw log file</a></p>
    <pre>{escaped}</pre>
  </body>
</html>
"
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
