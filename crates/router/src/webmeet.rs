// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Web meet: WebSocket signaling for WebRTC rooms.
//!
//! The Router forwards SDP offers/answers and ICE candidates between
//! participants of a room and maintains the roster. Media never touches
//! the Router.

use crate::auth::{require_token, DenyStyle};
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Signaling state: room → participant id → outbound sender.
#[derive(Clone, Default)]
pub struct MeetRooms {
    rooms: Arc<Mutex<HashMap<String, HashMap<String, mpsc::UnboundedSender<String>>>>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Signal {
    Offer { to: String, sdp: serde_json::Value },
    Answer { to: String, sdp: serde_json::Value },
    Ice { to: String, candidate: serde_json::Value },
    Leave,
}

/// `GET /webmeet` — meeting UI page.
pub async fn webmeet_page(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Meet),
        &headers,
        &query,
        DenyStyle::Html,
    ) {
        return denied;
    }
    let room = query.get("room").cloned().unwrap_or_else(|| "main".to_string());
    let moderator = query.get("moderator").is_some();
    Html(format!(
        "<!doctype html><html><head><title>berth meet — {room}</title></head>\
         <body><h1>Room: {room}</h1><p>moderator: {moderator}</p>\
         <div id=\"roster\"></div></body></html>"
    ))
    .into_response()
}

/// `GET|UPGRADE /webmeet/ws` — signaling socket.
pub async fn webmeet_ws(
    State(state): State<AppState>,
    axum::Extension(rooms): axum::Extension<MeetRooms>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    upgrade: WebSocketUpgrade,
) -> Response {
    if let Err(denied) = require_token(
        &state,
        Some(berth_workspace::WebInterface::Meet),
        &headers,
        &query,
        DenyStyle::Json,
    ) {
        return denied;
    }
    let room = query.get("room").cloned().unwrap_or_else(|| "main".to_string());
    upgrade.on_upgrade(move |socket| participate(rooms, room, socket))
}

async fn participate(rooms: MeetRooms, room: String, socket: WebSocket) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Join: register, tell the newcomer who is here, tell the room.
    let peers: Vec<String> = {
        let mut rooms = rooms.rooms.lock();
        let members = rooms.entry(room.clone()).or_default();
        let peers = members.keys().cloned().collect();
        members.insert(id.clone(), tx);
        peers
    };
    let _ = rooms.send_to(&room, &id, &json!({"type": "welcome", "id": id.as_str(), "peers": peers}).to_string());
    rooms.broadcast(&room, &id, &json!({"type": "joined", "id": id.as_str()}).to_string());

    let (mut sink, mut source) = split_socket(socket);

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(text) => {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = source.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Signal>(&text) {
                            Ok(Signal::Leave) => break,
                            Ok(Signal::Offer { to, sdp }) => {
                                rooms.send_to(&room, &to,
                                    &json!({"type": "offer", "from": id.as_str(), "sdp": sdp}).to_string());
                            }
                            Ok(Signal::Answer { to, sdp }) => {
                                rooms.send_to(&room, &to,
                                    &json!({"type": "answer", "from": id.as_str(), "sdp": sdp}).to_string());
                            }
                            Ok(Signal::Ice { to, candidate }) => {
                                rooms.send_to(&room, &to,
                                    &json!({"type": "ice", "from": id.as_str(), "candidate": candidate}).to_string());
                            }
                            Err(_) => {
                                tracing::debug!(room = %room, "dropping malformed signal");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    // Leave: unregister and tell the room.
    {
        let mut map = rooms.rooms.lock();
        if let Some(members) = map.get_mut(&room) {
            members.remove(&id);
            if members.is_empty() {
                map.remove(&room);
            }
        }
    }
    rooms.broadcast(&room, &id, &json!({"type": "left", "id": id.as_str()}).to_string());
}

impl MeetRooms {
    /// Send to one participant; returns whether they were present.
    fn send_to(&self, room: &str, participant: &str, text: &str) -> bool {
        let rooms = self.rooms.lock();
        rooms
            .get(room)
            .and_then(|members| members.get(participant))
            .map(|tx| tx.send(text.to_string()).is_ok())
            .unwrap_or(false)
    }

    /// Send to everyone in the room except `from`.
    fn broadcast(&self, room: &str, from: &str, text: &str) {
        let rooms = self.rooms.lock();
        if let Some(members) = rooms.get(room) {
            for (id, tx) in members {
                if id != from {
                    let _ = tx.send(text.to_string());
                }
            }
        }
    }

    /// Current roster of a room.
    pub fn roster(&self, room: &str) -> Vec<String> {
        self.rooms
            .lock()
            .get(room)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn split_socket(socket: WebSocket) -> (SocketSink, SocketSource) {
    use futures_util::StreamExt;
    let (sink, source) = socket.split();
    (SocketSink(sink), SocketSource(source))
}

struct SocketSink(futures_util::stream::SplitSink<WebSocket, Message>);

impl SocketSink {
    async fn send(&mut self, message: Message) -> Result<(), axum::Error> {
        use futures_util::SinkExt;
        self.0.send(message).await
    }
}

struct SocketSource(futures_util::stream::SplitStream<WebSocket>);

impl SocketSource {
    async fn recv(&mut self) -> Option<Result<Message, axum::Error>> {
        use futures_util::StreamExt;
        self.0.next().await
    }
}

#[cfg(test)]
#[path = "webmeet_tests.rs"]
mod tests;
