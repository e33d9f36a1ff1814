// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain HTTP endpoints: health, status, dashboard, workspace files, blobs.

use crate::auth::{require_token, DenyStyle};
use crate::state::{AppState, RouteHealth};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use std::collections::HashMap;

pub async fn root_redirect() -> Redirect {
    Redirect::temporary("/dashboard")
}

/// `GET /health` — the only unauthenticated endpoint.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let table = state.routing();
    Json(json!({
        "status": "healthy",
        "uptime": state.uptime_secs(),
        "port": table.port,
        "routes": table.routes.len(),
    }))
}

/// `GET /status` — token-gated system status.
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(&state, None, &headers, &query, DenyStyle::Json) {
        return denied;
    }

    let table = state.routing();
    let health = state.health().read().clone();
    let routes: serde_json::Map<String, serde_json::Value> = table
        .routes
        .iter()
        .map(|(name, route)| {
            let health = match health.get(name).copied().unwrap_or_default() {
                RouteHealth::Pending => "pending",
                RouteHealth::Healthy => "healthy",
                RouteHealth::Unhealthy => "unhealthy",
            };
            (
                name.clone(),
                json!({
                    "container": route.container,
                    "hostPort": route.host_port,
                    "repo": route.repo,
                    "agent": route.agent,
                    "health": health,
                }),
            )
        })
        .collect();

    Json(json!({
        "status": "running",
        "uptimeSecs": state.uptime_secs(),
        "port": table.port,
        "routes": routes,
    }))
    .into_response()
}

/// `GET /dashboard` — static overview page.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Dashboard),
        &headers,
        &query,
        DenyStyle::Html,
    ) {
        return denied;
    }

    let table = state.routing();
    let mut rows = String::new();
    for (name, route) in &table.routes {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}/{}</td><td>{}</td><td>:{}</td></tr>\n",
            name, route.repo, route.agent, route.container, route.host_port
        ));
    }
    Html(format!(
        "<!doctype html><html><head><title>berth dashboard</title></head>\
         <body><h1>Agents</h1>\
         <table border=\"1\"><tr><th>Name</th><th>Source</th><th>Container</th><th>Port</th></tr>\
         {rows}</table></body></html>"
    ))
    .into_response()
}

/// `GET /workspace-files/*path` — token-gated file serving from the
/// workspace root with a traversal guard.
pub async fn workspace_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(&state, None, &headers, &query, DenyStyle::Json) {
        return denied;
    }

    let relative = path.trim_start_matches('/');
    if relative.split('/').any(|part| part == "..") {
        return StatusCode::FORBIDDEN.into_response();
    }
    let full = state.paths().root().join(relative);
    match tokio::fs::read(&full).await {
        Ok(bytes) => {
            let mime = guess_mime(relative);
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `POST /blobs` — store a blob, return its id.
pub async fn blob_put(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Err(denied) = require_token(&state, None, &headers, &query, DenyStyle::Json) {
        return denied;
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    let dir = state.paths().blobs_dir();
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        tracing::warn!(error = %e, "blob dir create failed");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match tokio::fs::write(dir.join(&id), &body).await {
        Ok(_) => (StatusCode::CREATED, Json(json!({"id": id}))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "blob write failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /blobs/:id` — fetch a stored blob.
pub async fn blob_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(&state, None, &headers, &query, DenyStyle::Json) {
        return denied;
    }
    if id.contains('/') || id.contains("..") {
        return StatusCode::FORBIDDEN.into_response();
    }
    match tokio::fs::read(state.paths().blobs_dir().join(&id)).await {
        Ok(bytes) => {
            ([(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

fn guess_mime(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" | "log" | "md" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod tests;
