// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use berth_core::routing::{Route, RoutingTable};
use berth_engine::{ContainerRuntime, Engine};
use berth_workspace::{write_routing_table, ServersConfig, WebInterface, WorkspacePaths};
use tower::ServiceExt;

fn test_state(temp: &tempfile::TempDir, upstream_port: Option<u16>) -> (AppState, String) {
    let paths = WorkspacePaths::at(temp.path());
    let mut table = RoutingTable::new(8088);
    if let Some(port) = upstream_port {
        table.routes.insert(
            "demo".to_string(),
            Route {
                container: "orch_basic_demo_00000000".to_string(),
                host_port: port,
                repo: "basic".to_string(),
                agent: "demo".to_string(),
                host_path: temp.path().join("agents/demo").to_string_lossy().into_owned(),
            },
        );
    }
    write_routing_table(&paths, &table).unwrap();

    let mut servers = ServersConfig::default();
    servers.ensure_tokens(8088);
    let token = servers.get(WebInterface::Chat).unwrap().token.clone();

    let engine = Engine::with_runtime(ContainerRuntime::Docker);
    (AppState::new(paths, servers, engine), token)
}

fn app(state: AppState) -> Router {
    Router::new().route("/webchat/:agent/message", post(webchat_message)).with_state(state)
}

fn message_request(token: &str, agent: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(format!("/webchat/{}/message?token={}", agent, token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"message": "hello agent"}"#))
        .unwrap()
}

fn chat_event(agent: &str, payload: serde_json::Value) -> ChatEvent {
    ChatEvent { agent: agent.to_string(), payload }
}

#[test]
fn event_data_filters_by_agent() {
    let payload = json!({"from": "demo", "result": "hi"});
    let data = event_data(Ok(chat_event("demo", payload.clone())), "demo").unwrap();
    assert_eq!(data, payload.to_string());

    // Another agent's event is not delivered.
    assert_eq!(event_data(Ok(chat_event("other", payload)), "demo"), None);
}

#[test]
fn event_data_skips_lagged_receivers() {
    assert_eq!(event_data(Err(BroadcastStreamRecvError::Lagged(7)), "demo"), None);
}

#[tokio::test]
async fn chat_stream_delivers_only_the_subscribed_agent() {
    let (tx, rx) = tokio::sync::broadcast::channel::<ChatEvent>(16);
    let stream = chat_stream(rx, "demo".to_string());
    tokio::pin!(stream);

    tx.send(chat_event("demo", json!({"n": 1}))).unwrap();
    tx.send(chat_event("other", json!({"n": 2}))).unwrap();
    tx.send(chat_event("demo", json!({"n": 3}))).unwrap();
    drop(tx);

    // The "other" event never surfaces; the stream ends when the sender
    // goes away. Payload mapping itself is covered by the event_data tests.
    let mut delivered = 0;
    while let Some(event) = stream.next().await {
        event.unwrap();
        delivered += 1;
    }
    assert_eq!(delivered, 2);
}

#[test]
fn chat_message_parses() {
    let message: ChatMessage =
        serde_json::from_str(r#"{"message": "ship it"}"#).unwrap();
    assert_eq!(message.message, "ship it");
    // The message field is required.
    assert!(serde_json::from_str::<ChatMessage>(r#"{"text": "nope"}"#).is_err());
}

#[tokio::test]
async fn message_denied_without_token() {
    let temp = tempfile::tempdir().unwrap();
    let (state, _token) = test_state(&temp, None);
    let response = app(state)
        .oneshot(message_request("wrong-token", "demo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn message_to_unknown_agent_is_404() {
    let temp = tempfile::tempdir().unwrap();
    let (state, token) = test_state(&temp, None);
    let response = app(state).oneshot(message_request(&token, "ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_forwards_as_tools_call_and_broadcasts() {
    let temp = tempfile::tempdir().unwrap();

    // Upstream MCP agent answering tools/call.
    let upstream = Router::new().route(
        "/mcp",
        post(|body: String| async move {
            let request: serde_json::Value = serde_json::from_str(&body).unwrap();
            assert_eq!(request["method"], "tools/call");
            assert_eq!(request["params"]["name"], "chat");
            assert_eq!(request["params"]["arguments"]["message"], "hello agent");
            axum::Json(json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": {"content": "hi back"}
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    let (state, token) = test_state(&temp, Some(port));
    let mut events = state.chat_events().subscribe();

    let response = app(state).oneshot(message_request(&token, "demo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["accepted"], true);

    let event = events.recv().await.unwrap();
    assert_eq!(event.agent, "demo");
    assert_eq!(event.payload["from"], "demo");
    assert_eq!(event.payload["result"]["content"], "hi back");
}

#[tokio::test]
async fn unreachable_agent_is_502_and_broadcasts_the_failure() {
    let temp = tempfile::tempdir().unwrap();
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let (state, token) = test_state(&temp, Some(dead));
    let mut events = state.chat_events().subscribe();

    let response = app(state).oneshot(message_request(&token, "demo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], -32603);

    let event = events.recv().await.unwrap();
    assert_eq!(event.agent, "demo");
    assert_eq!(event.payload["error"], "agent unreachable");
}

// Keep the handler signature honest: webchat_events must reject without a
// chat token even for an agent with a route.
#[tokio::test]
async fn events_endpoint_requires_token() {
    let temp = tempfile::tempdir().unwrap();
    let (state, _token) = test_state(&temp, None);
    let response = webchat_events(
        State(state),
        axum::extract::Path("demo".to_string()),
        axum::extract::Query(HashMap::new()),
        axum::http::HeaderMap::new(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
