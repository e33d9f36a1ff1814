// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authentication gate.
//!
//! Every endpoint except `GET /health` requires a bearer token, extracted
//! from (in order) the `?token=` query parameter, the interface cookie
//! (`orch_<iface>_token`), or `Authorization: Bearer`. HTML endpoints get a
//! login page on 401; API endpoints get JSON.

use crate::state::AppState;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use berth_workspace::WebInterface;
use std::collections::HashMap;

/// What a denied request should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyStyle {
    Html,
    Json,
}

/// Extract the presented token from query, cookie, or bearer header.
pub fn extract_token(
    iface: WebInterface,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Option<String> {
    if let Some(token) = query.get("token") {
        if !token.is_empty() {
            return Some(token.clone());
        }
    }

    if let Some(cookies) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        let wanted = iface.cookie_name();
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == wanted && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Whether the presented token is valid for `iface`.
///
/// Cross-interface tokens are accepted for API-style endpoints (`any`
/// matching) only when `iface` is `None`.
pub fn token_valid(
    state: &AppState,
    iface: Option<WebInterface>,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> bool {
    match iface {
        Some(iface) => extract_token(iface, headers, query)
            .map(|token| state.servers().token_matches(iface, &token))
            .unwrap_or(false),
        None => WebInterface::ALL.iter().any(|&iface| {
            extract_token(iface, headers, query)
                .map(|token| state.servers().token_matches_any(&token))
                .unwrap_or(false)
        }),
    }
}

/// Gate a request; `Err` is the ready-to-return 401 response.
pub fn require_token(
    state: &AppState,
    iface: Option<WebInterface>,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    style: DenyStyle,
) -> Result<(), Response> {
    if token_valid(state, iface, headers, query) {
        return Ok(());
    }
    tracing::debug!(iface = ?iface, "rejected unauthenticated request");
    Err(match style {
        DenyStyle::Html => (StatusCode::UNAUTHORIZED, Html(LOGIN_PAGE)).into_response(),
        DenyStyle::Json => (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response(),
    })
}

/// Minimal login page served to unauthenticated browsers.
const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
<head><title>berth</title></head>
<body>
<h1>Authentication required</h1>
<form method="get">
  <label>Access token: <input type="password" name="token" autofocus></label>
  <button type="submit">Open</button>
</form>
</body>
</html>
"#;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
