// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use axum::http::HeaderValue;

fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(name, HeaderValue::from_str(value).unwrap());
    headers
}

#[test]
fn query_param_wins() {
    let mut query = HashMap::new();
    query.insert("token".to_string(), "from-query".to_string());
    let headers = headers_with(header::AUTHORIZATION, "Bearer from-header");
    assert_eq!(
        extract_token(WebInterface::Chat, &headers, &query).as_deref(),
        Some("from-query")
    );
}

#[test]
fn cookie_is_interface_scoped() {
    let headers = headers_with(
        header::COOKIE,
        "other=1; orch_chat_token=chat-tok; orch_meet_token=meet-tok",
    );
    let query = HashMap::new();
    assert_eq!(
        extract_token(WebInterface::Chat, &headers, &query).as_deref(),
        Some("chat-tok")
    );
    assert_eq!(
        extract_token(WebInterface::Meet, &headers, &query).as_deref(),
        Some("meet-tok")
    );
    assert_eq!(extract_token(WebInterface::Terminal, &headers, &query), None);
}

#[test]
fn bearer_header_is_last_resort() {
    let headers = headers_with(header::AUTHORIZATION, "Bearer abc123");
    let query = HashMap::new();
    assert_eq!(
        extract_token(WebInterface::Dashboard, &headers, &query).as_deref(),
        Some("abc123")
    );
}

#[test]
fn empty_tokens_are_ignored() {
    let mut query = HashMap::new();
    query.insert("token".to_string(), String::new());
    let headers = headers_with(header::COOKIE, "orch_chat_token=");
    assert_eq!(extract_token(WebInterface::Chat, &headers, &query), None);
}

#[test]
fn missing_everything_is_none() {
    assert_eq!(
        extract_token(WebInterface::Chat, &HeaderMap::new(), &HashMap::new()),
        None
    );
}
