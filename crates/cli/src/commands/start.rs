// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth start` / `stop` / `restart` / `shutdown`.
//!
//! Start runs the full 12-step lifecycle for every enabled agent (or one,
//! when named), writes the routing table, and launches the Watchdog
//! detached. The Watchdog owns the Router from there.

use crate::commands::routing;
use crate::exit_error::ExitError;
use crate::workspace_ctx::Ctx;
use anyhow::{anyhow, Result};
use berth_provision::lifecycle::{context_for_record, run_lifecycle};
use berth_provision::AgentServiceManager;
use berth_workspace::{pidfile, AgentRegistry, ServersConfig};
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

#[derive(Args)]
pub struct StartArgs {
    /// Agent to start (all enabled agents when omitted)
    pub name: Option<String>,
    /// Router listen port
    pub port: Option<u16>,
}

#[derive(Args)]
pub struct RestartArgs {
    /// Router listen port
    pub port: Option<u16>,
}

pub async fn start(args: StartArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    let port = ctx.router_port(args.port);
    let engine = ctx.engine().map_err(|e| ExitError::new(1, e.to_string()))?;

    let registry = AgentRegistry::load(&ctx.paths)?;
    let selected: Vec<_> = registry
        .iter()
        .filter(|record| args.name.as_deref().is_none_or(|name| record.name == name))
        .cloned()
        .collect();
    if let Some(name) = &args.name {
        if selected.is_empty() {
            return Err(ExitError::new(
                1,
                format!("no enabled agent '{}'. Run `berth enable agent {}` first", name, name),
            )
            .into());
        }
    }

    // Per-interface tokens must exist before the Router comes up.
    let mut servers = ServersConfig::load(&ctx.paths)?;
    if servers.ensure_tokens(port) {
        servers.save(&ctx.paths)?;
    }

    let manager = AgentServiceManager::new(engine.clone());
    let mut known_ports: HashMap<String, u16> = HashMap::new();
    let mut failed = false;

    for record in &selected {
        println!("Starting {} ({})", record.name, record.container_name);
        let lifecycle_ctx = context_for_record(&ctx.paths, record, port)
            .map_err(|e| ExitError::new(2, e.to_string()))?;

        let result = run_lifecycle(&manager, &lifecycle_ctx)
            .await
            .map_err(|e| ExitError::new(lifecycle_exit_code(&e), e.to_string()))?;

        for step in &result.steps {
            let mark = if step.success { "ok" } else { "FAILED" };
            match &step.error {
                Some(error) => println!("  [{:>6}] {} — {}", mark, step.name, error),
                None => println!("  [{:>6}] {}", mark, step.name),
            }
        }
        if let Some(outcome) = &result.outcome {
            known_ports.insert(record.name.clone(), outcome.host_port);
            if !outcome.ready {
                println!("  note: readiness probe did not pass yet; route starts unhealthy");
            }
        }
        if !result.success() {
            failed = true;
        }
    }

    let table = routing::regenerate(&ctx.paths, &engine, port, &known_ports).await?;
    println!("Routing table: {} route(s) on port {}", table.routes.len(), port);

    if failed {
        return Err(ExitError::new(1, "one or more agents failed to start".to_string()).into());
    }

    spawn_watchdog(&ctx, port)?;
    Ok(())
}

fn lifecycle_exit_code(error: &berth_provision::ProvisionError) -> i32 {
    use berth_core::error::FailureKind;
    match error.kind() {
        FailureKind::Config => 2,
        FailureKind::MissingSecret => 3,
        _ => 1,
    }
}

/// Launch `berth-watchdog` detached unless one is already alive.
fn spawn_watchdog(ctx: &Ctx, port: u16) -> Result<()> {
    if let Some(pid) = pidfile::live_pid(&ctx.paths.watchdog_pid_file()) {
        println!("Watchdog already running (pid {})", pid);
        return Ok(());
    }

    let binary = find_sibling("berth-watchdog");
    let child = std::process::Command::new(&binary)
        .current_dir(ctx.paths.root())
        .env("ROUTER_PORT", port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("failed to spawn {}: {}", binary.display(), e))?;
    println!("Watchdog started (pid {}), router on port {}", child.id(), port);
    Ok(())
}

fn find_sibling(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(name);
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from(name)
}

pub async fn stop() -> Result<()> {
    let ctx = Ctx::discover()?;
    let stopped = signal_watchdog(&ctx)?;
    if stopped {
        println!("Router stopped");
    } else {
        println!("Router not running");
    }
    Ok(())
}

/// SIGTERM the Watchdog and wait for it to go away.
fn signal_watchdog(ctx: &Ctx) -> Result<bool> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pidfile::live_pid(&ctx.paths.watchdog_pid_file()) else {
        // No watchdog; a stray router gets the signal directly.
        if let Some(router_pid) = pidfile::live_pid(&ctx.paths.router_pid_file()) {
            let _ = kill(Pid::from_raw(router_pid as i32), Signal::SIGTERM);
            return Ok(true);
        }
        return Ok(false);
    };

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| anyhow!("failed to signal watchdog (pid {}): {}", pid, e))?;

    for _ in 0..50 {
        if !pidfile::process_alive(pid) {
            return Ok(true);
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    Err(anyhow!("watchdog (pid {}) did not exit within 5s", pid))
}

pub async fn restart(args: RestartArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    let port = ctx.router_port(args.port);
    if signal_watchdog(&ctx)? {
        // Give the OS a moment to release the listen port.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }
    spawn_watchdog(&ctx, port)?;
    Ok(())
}

pub async fn shutdown() -> Result<()> {
    let ctx = Ctx::discover()?;
    let stopped = signal_watchdog(&ctx)?;

    // Tear down every managed container.
    match ctx.engine() {
        Ok(engine) => {
            let manager = AgentServiceManager::new(engine.clone());
            let registry = AgentRegistry::load(&ctx.paths)?;
            for record in registry.iter() {
                if let Err(e) = manager.teardown(&record.container_name).await {
                    tracing::warn!(container = %record.container_name, error = %e, "teardown failed");
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "engine unavailable, skipping container teardown"),
    }

    if stopped {
        println!("Shutdown complete");
    } else {
        println!("Router was not running; containers torn down");
    }
    Ok(())
}
