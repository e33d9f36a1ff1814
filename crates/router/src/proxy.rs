// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The MCP proxy — the Router's hot path.
//!
//! `* /mcps/:agent/mcp` forwards method, headers (minus hop-by-hop), and
//! body verbatim to `127.0.0.1:<hostPort>/mcp`. `text/event-stream`
//! responses are streamed chunk-by-chunk in arrival order with no
//! buffering; everything else is buffered with a 30-second timeout. When
//! the client disconnects, axum drops this future and the reqwest response
//! stream with it, which closes the upstream connection.

use crate::state::{AppState, RouteHealth};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use berth_core::mcp::{codes, JsonRpcResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Timeout for buffered (non-SSE) upstream responses.
const BUFFERED_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers never forwarded in either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str())
}

fn rpc_error(status: StatusCode, id: Value, code: i64, message: &str) -> Response {
    (status, axum::Json(JsonRpcResponse::error(id, code, message))).into_response()
}

/// Pull the JSON-RPC id out of a request body for error envelopes.
fn request_id(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("id").cloned())
        .unwrap_or(Value::Null)
}

pub async fn mcp_proxy(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Err(denied) =
        crate::auth::require_token(&state, None, &headers, &query, crate::auth::DenyStyle::Json)
    {
        return denied;
    }

    let id = request_id(&body);

    let table = state.routing();
    let Some(route) = table.route(&agent) else {
        return rpc_error(
            StatusCode::NOT_FOUND,
            id,
            codes::METHOD_NOT_FOUND,
            &format!("no agent '{}'", agent),
        );
    };

    if state.route_health(&agent) == RouteHealth::Unhealthy {
        return rpc_error(
            StatusCode::SERVICE_UNAVAILABLE,
            id,
            codes::INTERNAL_ERROR,
            &format!("agent '{}' is unhealthy", agent),
        );
    }

    let url = format!("http://127.0.0.1:{}/mcp", route.host_port);
    let mut upstream = state.client().request(method, &url);
    for (name, value) in headers.iter() {
        if !is_hop_by_hop(name.as_str()) {
            upstream = upstream.header(name, value);
        }
    }
    let response = match upstream.body(body).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(agent = %agent, error = %e, "upstream MCP call failed");
            return rpc_error(
                StatusCode::BAD_GATEWAY,
                id,
                codes::INTERNAL_ERROR,
                "upstream agent unreachable",
            );
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers() {
        if !is_hop_by_hop(name.as_str()) {
            builder = builder.header(name, value);
        }
    }

    if content_type.starts_with("text/event-stream") {
        // Stream through unmodified; chunks flush in arrival order.
        let builder = builder
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::CONNECTION, "keep-alive");
        let stream = response.bytes_stream();
        return builder
            .body(Body::from_stream(stream))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    match tokio::time::timeout(BUFFERED_TIMEOUT, response.bytes()).await {
        Ok(Ok(bytes)) => builder
            .body(Body::from(bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Ok(Err(e)) => {
            tracing::warn!(agent = %agent, error = %e, "upstream body read failed");
            rpc_error(StatusCode::BAD_GATEWAY, id, codes::INTERNAL_ERROR, "upstream read failed")
        }
        Err(_) => rpc_error(
            StatusCode::GATEWAY_TIMEOUT,
            id,
            codes::REQUEST_TIMEOUT,
            "upstream agent timed out",
        ),
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
