// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-web-interface server config (`.meta/servers.json`): one port+token
//! entry for each of {terminal, chat, meet, dashboard}.

use crate::error::WorkspaceError;
use crate::paths::WorkspacePaths;
use crate::store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four token-gated web interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebInterface {
    Terminal,
    Chat,
    Meet,
    Dashboard,
}

impl WebInterface {
    pub const ALL: [WebInterface; 4] = [
        WebInterface::Terminal,
        WebInterface::Chat,
        WebInterface::Meet,
        WebInterface::Dashboard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebInterface::Terminal => "terminal",
            WebInterface::Chat => "chat",
            WebInterface::Meet => "meet",
            WebInterface::Dashboard => "dashboard",
        }
    }

    /// Cookie name carrying this interface's token.
    pub fn cookie_name(&self) -> String {
        format!("orch_{}_token", self.as_str())
    }
}

impl fmt::Display for WebInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One interface's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub port: u16,
    pub token: String,
}

/// The servers config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServersConfig {
    entries: BTreeMap<WebInterface, ServerEntry>,
}

impl ServersConfig {
    pub fn load(paths: &WorkspacePaths) -> Result<Self, WorkspaceError> {
        Ok(store::read_json(&paths.servers_file())?.unwrap_or_default())
    }

    pub fn save(&self, paths: &WorkspacePaths) -> Result<(), WorkspaceError> {
        store::write_json(&paths.servers_file(), self)
    }

    /// Ensure every interface has an entry; missing ones get `port` and a
    /// fresh random token. Returns whether anything changed.
    pub fn ensure_tokens(&mut self, port: u16) -> bool {
        let mut changed = false;
        for iface in WebInterface::ALL {
            let entry = self.entries.entry(iface).or_insert_with(|| {
                changed = true;
                ServerEntry { port, token: uuid::Uuid::new_v4().simple().to_string() }
            });
            if entry.port != port {
                entry.port = port;
                changed = true;
            }
        }
        changed
    }

    pub fn get(&self, iface: WebInterface) -> Option<&ServerEntry> {
        self.entries.get(&iface)
    }

    /// Whether `token` is valid for `iface`.
    pub fn token_matches(&self, iface: WebInterface, token: &str) -> bool {
        self.get(iface).map(|e| !e.token.is_empty() && e.token == token).unwrap_or(false)
    }

    /// Whether `token` is valid for any interface (cross-interface links).
    pub fn token_matches_any(&self, token: &str) -> bool {
        WebInterface::ALL.iter().any(|iface| self.token_matches(*iface, token))
    }
}

#[cfg(test)]
#[path = "servers_tests.rs"]
mod tests;
