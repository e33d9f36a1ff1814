// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervising loop around one Router child process.
//!
//! Spawns `berthd`, applies [`RestartPolicy`] to every exit, probes
//! `/health` every 30 seconds, forwards SIGTERM/SIGINT with a 15-second
//! force-kill grace, and maintains the Router PID file. All console output
//! is EPIPE-safe.

use crate::policy::{ChildExit, Decision, RestartPolicy, HEALTH_LIMIT};
use berth_logs::{safe_eprintln, safe_println, LogWriter};
use berth_workspace::{pidfile, WorkspacePaths};
use serde_json::json;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};

/// Interval between health probes.
const HEALTH_INTERVAL: Duration = Duration::from_secs(30);
/// Health probe timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Grace period between forwarding a signal and force-killing the child.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Supervisor configuration.
pub struct Supervisor {
    pub paths: WorkspacePaths,
    pub router_port: u16,
    pub health_check_enabled: bool,
    pub log: LogWriter,
}

impl Supervisor {
    pub fn new(paths: WorkspacePaths, router_port: u16, health_check_enabled: bool) -> Self {
        let log = LogWriter::new(paths.logs_dir(), "watchdog");
        Self { paths, router_port, health_check_enabled, log }
    }

    /// Run until the policy says stop. Returns the process exit code.
    pub async fn run(&self) -> i32 {
        let mut policy = RestartPolicy::new();
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                safe_eprintln(&format!("watchdog: cannot install SIGTERM handler: {}", e));
                return 1;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                safe_eprintln(&format!("watchdog: cannot install SIGINT handler: {}", e));
                return 1;
            }
        };

        self.log.log_boot_event("watchdog_start", json!({"routerPort": self.router_port}));
        if let Err(e) = pidfile::write(&self.paths.watchdog_pid_file(), std::process::id()) {
            safe_eprintln(&format!("watchdog: pid file write failed: {}", e));
        }

        loop {
            let mut child = match self.spawn_router() {
                Ok(child) => child,
                Err(e) => {
                    safe_eprintln(&format!("watchdog: failed to spawn router: {}", e));
                    self.log.log_crash("spawn_failed", &e, json!({}));
                    return 1;
                }
            };
            let started = Instant::now();
            if let Some(pid) = child.id() {
                if let Err(e) = pidfile::write(&self.paths.router_pid_file(), pid) {
                    safe_eprintln(&format!("watchdog: pid file write failed: {}", e));
                }
                safe_println(&format!("watchdog: router started (pid {})", pid));
            }

            let exit = self.supervise_child(&mut child, &mut policy, &mut sigterm, &mut sigint).await;
            pidfile::remove(&self.paths.router_pid_file());

            let exit = match exit {
                ChildOutcome::Exited(exit) => exit,
                ChildOutcome::ShuttingDown(code) => {
                    self.log.log_shutdown("signal", code, json!({}));
                    return code;
                }
            };

            policy.on_runtime(started.elapsed());
            match policy.on_exit(exit, now_ms()) {
                Decision::Restart { delay } => {
                    safe_println(&format!(
                        "watchdog: router exited ({:?}), restarting in {:?}",
                        exit.code, delay
                    ));
                    self.log.append_log(
                        berth_logs::LogLevel::Warn,
                        "boot_operation",
                        json!({
                            "action": "router_restart",
                            "exitCode": exit.code,
                            "delayMs": delay.as_millis() as u64,
                        }),
                    );
                    tokio::time::sleep(delay).await;
                }
                Decision::Stop { exit_code } => {
                    safe_println(&format!(
                        "watchdog: router exited with {}; not restarting",
                        exit_code
                    ));
                    self.log.log_shutdown("router_exit", exit_code, json!({}));
                    return exit_code;
                }
                Decision::Trip => {
                    safe_eprintln("watchdog: circuit breaker tripped (5 restarts in 60s); giving up");
                    self.log.log_crash(
                        "circuit_breaker",
                        "router restarted 5 times within 60s",
                        json!({"window_secs": 60}),
                    );
                    return berth_core::error::exit_code::FATAL;
                }
            }
        }
    }

    /// Wait for the child while servicing health probes and signals.
    async fn supervise_child(
        &self,
        child: &mut Child,
        policy: &mut RestartPolicy,
        sigterm: &mut tokio::signal::unix::Signal,
        sigint: &mut tokio::signal::unix::Signal,
    ) -> ChildOutcome {
        let mut health_tick = tokio::time::interval(HEALTH_INTERVAL);
        health_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        health_tick.tick().await; // first tick is immediate; skip it

        loop {
            tokio::select! {
                status = child.wait() => {
                    let status = status.ok();
                    let code = status.and_then(|s| s.code());
                    return ChildOutcome::Exited(ChildExit {
                        code,
                        intentional_signal: killed_by_term_or_int(status),
                    });
                }
                _ = health_tick.tick(), if self.health_check_enabled => {
                    let healthy = self.probe_health().await;
                    if policy.on_health(healthy) {
                        safe_eprintln(&format!(
                            "watchdog: {} consecutive health failures, restarting router",
                            HEALTH_LIMIT
                        ));
                        self.log.log_process_signal("SIGTERM", "health check restart");
                        terminate(child);
                        // The exit arm picks up the resulting exit; the
                        // pending flag makes the policy restart it.
                    }
                }
                _ = sigterm.recv() => {
                    return self.shutdown_child(child, "SIGTERM").await;
                }
                _ = sigint.recv() => {
                    return self.shutdown_child(child, "SIGINT").await;
                }
            }
        }
    }

    async fn shutdown_child(&self, child: &mut Child, signal_name: &str) -> ChildOutcome {
        safe_println(&format!("watchdog: received {}, shutting down", signal_name));
        self.log.log_process_signal(signal_name, "forwarding to router");
        terminate(child);

        match tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await {
            Ok(status) => {
                let code = status.ok().and_then(|s| s.code()).unwrap_or(0);
                ChildOutcome::ShuttingDown(code)
            }
            Err(_) => {
                safe_eprintln("watchdog: router ignored shutdown; force-killing");
                let _ = child.start_kill();
                let _ = child.wait().await;
                ChildOutcome::ShuttingDown(0)
            }
        }
    }

    async fn probe_health(&self) -> bool {
        let url = format!("http://127.0.0.1:{}/health", self.router_port);
        let client = match reqwest::Client::builder().timeout(HEALTH_TIMEOUT).build() {
            Ok(client) => client,
            Err(_) => return false,
        };
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<serde_json::Value>().await {
                    Ok(body) => body["status"] == "healthy",
                    Err(_) => false,
                }
            }
            _ => false,
        }
    }

    fn spawn_router(&self) -> Result<Child, String> {
        let binary = find_router_binary();
        Command::new(&binary)
            .current_dir(self.paths.root())
            .env("ROUTER_PORT", self.router_port.to_string())
            .spawn()
            .map_err(|e| format!("{}: {}", binary.display(), e))
    }
}

enum ChildOutcome {
    Exited(ChildExit),
    ShuttingDown(i32),
}

/// Whether the child was killed by SIGTERM or SIGINT (intentional stop).
#[cfg(unix)]
fn killed_by_term_or_int(status: Option<std::process::ExitStatus>) -> bool {
    use std::os::unix::process::ExitStatusExt;
    matches!(status.and_then(|s| s.signal()), Some(15) | Some(2))
}

#[cfg(not(unix))]
fn killed_by_term_or_int(_status: Option<std::process::ExitStatus>) -> bool {
    false
}

/// Forward SIGTERM to the child.
fn terminate(child: &Child) {
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

/// Locate the `berthd` binary: sibling of the current executable, else PATH.
fn find_router_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("berthd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("berthd")
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}
