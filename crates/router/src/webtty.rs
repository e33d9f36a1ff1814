// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web terminal: a WebSocket bridging the browser to a shell exec'd inside
//! the agent's container.
//!
//! Text frames are written to the shell's stdin; shell stdout comes back
//! as text frames. `{"type":"resize","cols":N,"rows":N}` frames propagate
//! via `stty`. Closing the socket kills the exec.

use crate::auth::{require_token, DenyStyle};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use berth_engine::ExecOptions;
use serde::Deserialize;
use std::collections::HashMap;

/// `GET /webtty/:agent` — terminal UI page.
pub async fn webtty_page(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Terminal),
        &headers,
        &query,
        DenyStyle::Html,
    ) {
        return denied;
    }
    Html(format!(
        "<!doctype html><html><head><title>berth tty — {agent}</title></head>\
         <body><pre id=\"term\"></pre>\
         <script>\
         const ws = new WebSocket(`ws://${{location.host}}/webtty/{agent}/ws${{location.search}}`);\
         ws.onmessage = (e) => document.getElementById('term').textContent += e.data;\
         </script></body></html>"
    ))
    .into_response()
}

/// `GET|UPGRADE /webtty/:agent/ws` — the PTY bridge.
pub async fn webtty_ws(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    upgrade: WebSocketUpgrade,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Terminal),
        &headers,
        &query,
        DenyStyle::Json,
    ) {
        return denied;
    }

    let table = state.routing();
    let Some(route) = table.route(&agent) else {
        return axum::http::StatusCode::NOT_FOUND.into_response();
    };
    let container = route.container.clone();
    upgrade.on_upgrade(move |socket| bridge(state, socket, container))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ControlFrame {
    Resize { cols: u16, rows: u16 },
}

async fn bridge(state: AppState, mut socket: WebSocket, container: String) {
    let opts = ExecOptions::in_dir("/code");
    let mut stream = match state
        .engine()
        .exec_streamed(&container, &["sh", "-i"], &opts)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(container = %container, error = %e, "webtty exec failed");
            let _ = socket.send(Message::Text(format!("exec failed: {}\r\n", e))).await;
            let _ = socket.close().await;
            return;
        }
    };

    loop {
        tokio::select! {
            line = stream.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if socket.send(Message::Text(line + "\r\n")).await.is_err() {
                            break;
                        }
                    }
                    // Shell exited or read failed: close the socket.
                    Ok(None) | Err(_) => {
                        let _ = socket.close().await;
                        break;
                    }
                }
            }
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(ControlFrame::Resize { cols, rows }) =
                            serde_json::from_str::<ControlFrame>(&text)
                        {
                            let stty = format!("stty cols {} rows {}", cols, rows);
                            let _ = state
                                .engine()
                                .exec_shell(&container, &stty, &ExecOptions::default())
                                .await;
                            continue;
                        }
                        if stream.write_stdin(text.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        if stream.write_stdin(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // Socket gone (or shell dead): kill the exec.
    stream.kill().await;
}

#[cfg(test)]
#[path = "webtty_tests.rs"]
mod tests;
