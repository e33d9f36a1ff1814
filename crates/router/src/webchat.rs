// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web chat: user messages go to the agent as MCP `tools/call` requests;
//! agent responses stream back to the browser over Server-Sent Events.

use crate::auth::{require_token, DenyStyle};
use crate::state::{AppState, ChatEvent};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use berth_core::mcp::{codes, JsonRpcRequest, JsonRpcResponse};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// `GET /webchat/:agent` — chat UI page.
pub async fn webchat_page(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Chat),
        &headers,
        &query,
        DenyStyle::Html,
    ) {
        return denied;
    }
    Html(format!(
        "<!doctype html><html><head><title>berth chat — {agent}</title></head>\
         <body><div id=\"log\"></div>\
         <form id=\"f\"><input id=\"m\" autofocus><button>Send</button></form>\
         <script>\
         const log = (text) => {{\
           const div = document.createElement('div');\
           div.textContent = text;\
           document.getElementById('log').appendChild(div);\
         }};\
         const events = new EventSource(`/webchat/{agent}/events${{location.search}}`);\
         events.onmessage = (e) => log(e.data);\
         document.getElementById('f').onsubmit = async (e) => {{\
           e.preventDefault();\
           const input = document.getElementById('m');\
           await fetch(`/webchat/{agent}/message${{location.search}}`, {{\
             method: 'POST',\
             headers: {{'content-type': 'application/json'}},\
             body: JSON.stringify({{message: input.value}}),\
           }});\
           input.value = '';\
         }};\
         </script></body></html>"
    ))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

/// `POST /webchat/:agent/message` — forward one user message to the agent.
pub async fn webchat_message(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(message): Json<ChatMessage>,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Chat),
        &headers,
        &query,
        DenyStyle::Json,
    ) {
        return denied;
    }

    let table = state.routing();
    let Some(route) = table.route(&agent) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "unknown agent"}))).into_response();
    };

    let request = JsonRpcRequest::new(
        uuid::Uuid::new_v4().to_string(),
        "tools/call",
        Some(json!({"name": "chat", "arguments": {"message": message.message}})),
    );
    let url = format!("http://127.0.0.1:{}/mcp", route.host_port);
    let response = state.client().post(&url).json(&request).send().await;

    let payload = match response {
        Ok(response) => match response.json::<JsonRpcResponse>().await {
            Ok(rpc) => match (rpc.result, rpc.error) {
                (Some(result), _) => json!({"from": agent.as_str(), "result": result}),
                (None, Some(error)) => json!({"from": agent.as_str(), "error": error.message}),
                (None, None) => json!({"from": agent.as_str(), "error": "empty response"}),
            },
            Err(e) => {
                json!({"from": agent.as_str(), "error": format!("bad upstream payload: {}", e)})
            }
        },
        Err(e) => {
            tracing::warn!(agent = %agent, error = %e, "chat upstream failed");
            let envelope =
                JsonRpcResponse::error(json!(null), codes::INTERNAL_ERROR, "agent unreachable");
            let payload = json!({"from": agent.as_str(), "error": "agent unreachable"});
            let _ = state.chat_events().send(ChatEvent { agent, payload });
            return (StatusCode::BAD_GATEWAY, Json(envelope)).into_response();
        }
    };

    let _ = state.chat_events().send(ChatEvent { agent, payload });
    Json(json!({"accepted": true})).into_response()
}

/// `GET /webchat/:agent/events` — the SSE stream of agent responses.
pub async fn webchat_events(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Chat),
        &headers,
        &query,
        DenyStyle::Json,
    ) {
        return denied;
    }

    let receiver = state.chat_events().subscribe();
    let stream = chat_stream(receiver, agent);
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

fn chat_stream(
    receiver: tokio::sync::broadcast::Receiver<ChatEvent>,
    agent: String,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(receiver).filter_map(move |event| {
        event_data(event, &agent).map(|data| Ok(Event::default().data(data)))
    })
}

/// SSE data for one broadcast item, `None` when it is not for `agent`.
///
/// Lagged receivers and other agents' events are skipped.
fn event_data(
    event: Result<ChatEvent, BroadcastStreamRecvError>,
    agent: &str,
) -> Option<String> {
    match event {
        Ok(event) if event.agent == agent => Some(event.payload.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "webchat_tests.rs"]
mod tests;
