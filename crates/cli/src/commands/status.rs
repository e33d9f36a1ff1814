// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth status` — PID liveness, Router health, per-agent container state.

use crate::workspace_ctx::Ctx;
use anyhow::Result;
use berth_workspace::{pidfile, routing_io, AgentRegistry};
use std::time::Duration;

pub async fn run() -> Result<()> {
    let ctx = Ctx::discover()?;
    println!("Workspace: {}", ctx.paths.root().display());

    let watchdog = pidfile::live_pid(&ctx.paths.watchdog_pid_file());
    let router = pidfile::live_pid(&ctx.paths.router_pid_file());
    match (watchdog, router) {
        (Some(w), Some(r)) => println!("Watchdog: running (pid {}), Router: running (pid {})", w, r),
        (Some(w), None) => println!("Watchdog: running (pid {}), Router: starting", w),
        (None, Some(r)) => println!("Watchdog: not running, Router: running unsupervised (pid {})", r),
        (None, None) => println!("Router: not running. Start with `berth start`"),
    }

    let table = routing_io::read_routing_table(&ctx.paths)?.unwrap_or_default();
    if table.port != 0 {
        match router_health(table.port).await {
            Some(body) => println!(
                "Health: {} (port {}, uptime {}s)",
                body["status"].as_str().unwrap_or("?"),
                table.port,
                body["uptime"].as_u64().unwrap_or(0)
            ),
            None => println!("Health: no response on port {}", table.port),
        }
    }

    let registry = AgentRegistry::load(&ctx.paths)?;
    if registry.is_empty() {
        return Ok(());
    }
    let engine = ctx.engine().ok();
    println!("\n{:<16} {:<10} {:<10}", "AGENT", "ROUTE", "CONTAINER");
    for record in registry.iter() {
        let route = if table.route(&record.name).is_some() { "yes" } else { "no" };
        let state = match &engine {
            Some(engine) => match engine.state(&record.container_name).await {
                Ok(Some(state)) => state.status,
                Ok(None) => "absent".to_string(),
                Err(_) => "unknown".to_string(),
            },
            None => "unknown".to_string(),
        };
        println!("{:<16} {:<10} {:<10}", record.name, route, state);
    }
    Ok(())
}

async fn router_health(port: u16) -> Option<serde_json::Value> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(3)).build().ok()?;
    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .ok()?;
    response.json().await.ok()
}
