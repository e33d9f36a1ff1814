// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ensure_tokens_fills_all_interfaces() {
    let mut config = ServersConfig::default();
    assert!(config.ensure_tokens(8080));
    for iface in WebInterface::ALL {
        let entry = config.get(iface).unwrap();
        assert_eq!(entry.port, 8080);
        assert_eq!(entry.token.len(), 32);
    }
    // Second call with the same port changes nothing.
    assert!(!config.ensure_tokens(8080));
}

#[test]
fn ensure_tokens_updates_port_keeps_tokens() {
    let mut config = ServersConfig::default();
    config.ensure_tokens(8080);
    let token = config.get(WebInterface::Chat).unwrap().token.clone();

    assert!(config.ensure_tokens(9090));
    let entry = config.get(WebInterface::Chat).unwrap();
    assert_eq!(entry.port, 9090);
    assert_eq!(entry.token, token);
}

#[test]
fn token_matching() {
    let mut config = ServersConfig::default();
    config.ensure_tokens(8080);
    let token = config.get(WebInterface::Meet).unwrap().token.clone();

    assert!(config.token_matches(WebInterface::Meet, &token));
    assert!(!config.token_matches(WebInterface::Chat, &token));
    assert!(config.token_matches_any(&token));
    assert!(!config.token_matches_any("wrong"));
    assert!(!config.token_matches_any(""));
}

#[test]
fn cookie_names() {
    assert_eq!(WebInterface::Terminal.cookie_name(), "orch_terminal_token");
    assert_eq!(WebInterface::Dashboard.cookie_name(), "orch_dashboard_token");
}

#[test]
fn persists_one_entry_per_interface() {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());

    let mut config = ServersConfig::default();
    config.ensure_tokens(8080);
    config.save(&paths).unwrap();

    let loaded = ServersConfig::load(&paths).unwrap();
    for iface in WebInterface::ALL {
        assert_eq!(loaded.get(iface), config.get(iface));
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(paths.servers_file()).unwrap()).unwrap();
    assert!(json.get("terminal").is_some());
    assert!(json.get("dashboard").is_some());
}
