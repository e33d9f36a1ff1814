// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared Router state.

use berth_core::routing::RoutingTable;
use berth_engine::Engine;
use berth_logs::LogWriter;
use berth_workspace::{RoutingReader, ServersConfig, WorkspacePaths};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Route health as maintained by the container monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteHealth {
    /// No probe has reported yet; proxying is allowed.
    #[default]
    Pending,
    Healthy,
    /// Readiness failing; the proxy answers 503 until the monitor flips it.
    Unhealthy,
}

/// Health map shared between the monitor and request handlers.
pub type SharedHealth = Arc<RwLock<HashMap<String, RouteHealth>>>;

/// One chat event pushed to SSE subscribers.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    pub agent: String,
    pub payload: serde_json::Value,
}

struct Inner {
    paths: WorkspacePaths,
    reader: RoutingReader,
    servers: ServersConfig,
    health: SharedHealth,
    engine: Engine,
    client: reqwest::Client,
    log: LogWriter,
    started: Instant,
    chat_events: broadcast::Sender<ChatEvent>,
}

/// Cloneable handle to all router-wide state.
#[derive(Clone)]
pub struct AppState(Arc<Inner>);

impl AppState {
    pub fn new(paths: WorkspacePaths, servers: ServersConfig, engine: Engine) -> Self {
        let (chat_events, _) = broadcast::channel(256);
        let log = LogWriter::new(paths.logs_dir(), "router");
        Self(Arc::new(Inner {
            reader: RoutingReader::new(&paths),
            paths,
            servers,
            health: Arc::new(RwLock::new(HashMap::new())),
            engine,
            client: reqwest::Client::new(),
            log,
            started: Instant::now(),
            chat_events,
        }))
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.0.paths
    }

    pub fn routing(&self) -> RoutingTable {
        self.0.reader.current()
    }

    pub fn servers(&self) -> &ServersConfig {
        &self.0.servers
    }

    pub fn health(&self) -> &SharedHealth {
        &self.0.health
    }

    pub fn route_health(&self, name: &str) -> RouteHealth {
        self.0.health.read().get(name).copied().unwrap_or_default()
    }

    pub fn engine(&self) -> &Engine {
        &self.0.engine
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.0.client
    }

    pub fn log(&self) -> &LogWriter {
        &self.0.log
    }

    pub fn uptime_secs(&self) -> u64 {
        self.0.started.elapsed().as_secs()
    }

    pub fn chat_events(&self) -> &broadcast::Sender<ChatEvent> {
        &self.0.chat_events
    }
}
