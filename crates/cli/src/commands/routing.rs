// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing-table generation.
//!
//! A route exists exactly when an agent record exists AND the engine
//! reports its container (in any state). The CLI is the single writer.

use anyhow::Result;
use berth_core::routing::{Route, RoutingTable};
use berth_engine::Engine;
use berth_provision::service::AGENT_HTTP_PORT;
use berth_workspace::{write_routing_table, AgentRegistry, WorkspacePaths};
use std::collections::HashMap;

/// Rebuild and persist the routing table.
///
/// `known_ports` carries host ports already learned from provisioning so
/// a fresh engine query is not needed for every agent.
pub async fn regenerate(
    paths: &WorkspacePaths,
    engine: &Engine,
    port: u16,
    known_ports: &HashMap<String, u16>,
) -> Result<RoutingTable> {
    let registry = AgentRegistry::load(paths)?;
    let mut table = RoutingTable::new(port);

    for record in registry.iter() {
        let exists = engine.state(&record.container_name).await?.is_some();
        if !exists {
            continue;
        }
        let host_port = match known_ports.get(&record.name) {
            Some(&port) => port,
            None => engine
                .host_port_for(&record.container_name, AGENT_HTTP_PORT)
                .await?
                .unwrap_or_default(),
        };
        table.routes.insert(
            record.name.clone(),
            Route {
                container: record.container_name.clone(),
                host_port,
                repo: record.repo_name.clone(),
                agent: record.agent_name.clone(),
                host_path: paths
                    .agent_work_dir(&record.name)
                    .to_string_lossy()
                    .into_owned(),
            },
        );
    }

    write_routing_table(paths, &table)?;
    Ok(table)
}
