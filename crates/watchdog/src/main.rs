// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `berth-watchdog`: supervises exactly one Router (`berthd`) child.
//!
//! Spawned detached by `berth start`. Restart behavior, the circuit
//! breaker, and the health monitor live in [`policy`]; this binary wires
//! them to a real child process.

mod policy;
mod supervisor;

use berth_logs::safe_eprintln;
use berth_workspace::WorkspacePaths;
use supervisor::Supervisor;

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => !matches!(value.trim(), "0" | "false" | "no" | "off"),
        Err(_) => default,
    }
}

fn main() {
    berth_logs::mark_process_start();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if std::env::var("ORCH_DEBUG").is_ok() {
                    tracing_subscriber::EnvFilter::new("debug")
                } else {
                    tracing_subscriber::EnvFilter::new("info")
                }
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = match WorkspacePaths::discover_from_cwd() {
        Ok(paths) => paths,
        Err(e) => {
            safe_eprintln(&format!("berth-watchdog: {}", e));
            std::process::exit(1);
        }
    };

    let router_port = std::env::var("ROUTER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    let health_check_enabled = env_flag("HEALTH_CHECK_ENABLED", true);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            safe_eprintln(&format!("berth-watchdog: runtime init failed: {}", e));
            std::process::exit(1);
        }
    };

    let watchdog_pid = paths.watchdog_pid_file();
    let supervisor = Supervisor::new(paths, router_port, health_check_enabled);
    let code = runtime.block_on(supervisor.run());
    berth_workspace::pidfile::remove(&watchdog_pid);
    std::process::exit(code);
}
