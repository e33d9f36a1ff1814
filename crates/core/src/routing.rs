// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing table schema (`.meta/routing.json`).
//!
//! Generated by the CLI from agent records and engine state; consumed by the
//! Router. The schema is fixed; unknown fields are ignored for forward
//! compatibility.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The static-file-serving agent, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRoute {
    pub agent: String,
    pub host_path: String,
}

/// One agent route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Container name backing this route.
    pub container: String,
    /// Host port the container's agent HTTP port is published on.
    pub host_port: u16,
    pub repo: String,
    pub agent: String,
    /// Host path of the agent's working directory.
    pub host_path: String,
}

/// The routing table consumed by the Router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    /// Router listen port.
    pub port: u16,
    #[serde(default, rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_route: Option<StaticRoute>,
    #[serde(default)]
    pub routes: BTreeMap<String, Route>,
    /// Opaque SSO configuration subtree, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sso: Option<serde_json::Value>,
}

impl RoutingTable {
    pub fn new(port: u16) -> Self {
        Self { port, ..Self::default() }
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
