// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared command context: discovered workspace + lazily-detected engine.
//!
//! A single `Ctx` value is built per command invocation and threaded
//! through call sites; there is no ambient global state.

use anyhow::{anyhow, Result};
use berth_engine::Engine;
use berth_provision::RepoManager;
use berth_workspace::WorkspacePaths;

pub struct Ctx {
    pub paths: WorkspacePaths,
}

impl Ctx {
    /// Discover the workspace; fails with a remediation hint.
    pub fn discover() -> Result<Self> {
        let paths = WorkspacePaths::discover_from_cwd()
            .map_err(|e| anyhow!("{}. Run `berth init` in your project directory first", e))?;
        Ok(Self { paths })
    }

    pub fn engine(&self) -> Result<Engine> {
        Engine::detect().map_err(|e| anyhow!("{}", e))
    }

    pub fn repos(&self) -> RepoManager {
        RepoManager::new(self.paths.clone())
    }

    /// Router port: explicit argument, else `ROUTER_PORT`, else the routing
    /// table, else 8080.
    pub fn router_port(&self, explicit: Option<u16>) -> u16 {
        explicit
            .or_else(|| std::env::var("ROUTER_PORT").ok().and_then(|p| p.parse().ok()))
            .or_else(|| {
                berth_workspace::routing_io::read_routing_table(&self.paths)
                    .ok()
                    .flatten()
                    .map(|t| t.port)
            })
            .unwrap_or(8080)
    }
}
