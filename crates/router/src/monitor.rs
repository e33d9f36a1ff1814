// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container monitor: per-agent supervision inside the Router process.
//!
//! Every 5 seconds the monitor reconciles its targets against the agent
//! registry (type `agent` only), restarts stopped containers through the
//! service manager under a per-container circuit breaker, and keeps one
//! probe worker per target running liveness/readiness scripts.

use crate::state::{AppState, RouteHealth, SharedHealth};
use berth_engine::{Engine, ExecOptions};
use berth_manifest::ProbeSpec;
use berth_provision::lifecycle;
use berth_provision::AgentServiceManager;
use berth_workspace::AgentRegistry;
use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

/// Reconcile interval.
const TICK: Duration = Duration::from_secs(5);
/// How long a probe worker waits for the container to come up.
const PROBE_STARTUP_WAIT: Duration = Duration::from_secs(10);
/// Continuous runtime after which restart backoff resets.
const STABLE_RUNTIME: Duration = Duration::from_secs(60);
/// Continuous runtime after which CrashLoopBackOff retries reset.
const CRASH_LOOP_RESET: Duration = Duration::from_secs(600);
/// Probe output kept for diagnostics.
const PROBE_OUTPUT_CAP: usize = 1024 * 1024;

/// CrashLoopBackOff delay: `min(10s × 2^retries, 5min)`.
pub fn crash_loop_delay(retries: u32) -> Duration {
    let base = Duration::from_secs(10);
    let capped = base.checked_mul(1u32 << retries.min(5)).unwrap_or(Duration::from_secs(300));
    capped.min(Duration::from_secs(300))
}

/// Per-container restart breaker: same policy as the Router's watchdog.
#[derive(Debug)]
pub struct ContainerBreaker {
    backoff: Duration,
    restarts: Vec<u64>,
    tripped: bool,
}

impl Default for ContainerBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBreaker {
    const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
    const MAX_BACKOFF: Duration = Duration::from_secs(30);
    const WINDOW: Duration = Duration::from_secs(60);
    const LIMIT: usize = 5;

    pub fn new() -> Self {
        Self { backoff: Self::INITIAL_BACKOFF, restarts: Vec::new(), tripped: false }
    }

    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// Ask permission to restart at `now_ms`; `Some(delay)` grants it.
    pub fn request_restart(&mut self, now_ms: u64) -> Option<Duration> {
        if self.tripped {
            return None;
        }
        let cutoff = now_ms.saturating_sub(Self::WINDOW.as_millis() as u64);
        self.restarts.retain(|&t| t > cutoff);
        if self.restarts.len() >= Self::LIMIT {
            self.tripped = true;
            return None;
        }
        self.restarts.push(now_ms);
        let delay = self.backoff;
        self.backoff = (self.backoff * 2).min(Self::MAX_BACKOFF);
        Some(delay)
    }

    /// The container has been running continuously for `runtime`.
    pub fn on_runtime(&mut self, runtime: Duration) {
        if runtime >= STABLE_RUNTIME {
            self.backoff = Self::INITIAL_BACKOFF;
        }
    }
}

struct Target {
    record_name: String,
    container_name: String,
    breaker: ContainerBreaker,
    is_restarting: bool,
    running_since: Option<Instant>,
    probe: Option<tokio::task::JoinHandle<()>>,
    probe_cancel: CancellationToken,
}

/// The monitor loop.
pub struct ContainerMonitor {
    state: AppState,
    manager: AgentServiceManager,
    router_port: u16,
    targets: HashMap<String, Target>,
}

impl ContainerMonitor {
    pub fn new(state: AppState, router_port: u16) -> Self {
        let manager = AgentServiceManager::new(state.engine().clone());
        Self { state, manager, router_port, targets: HashMap::new() }
    }

    /// Run until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    for target in self.targets.values() {
                        target.probe_cancel.cancel();
                    }
                    return;
                }
                _ = tick.tick() => {
                    self.reconcile().await;
                }
            }
        }
    }

    /// One reconcile pass.
    async fn reconcile(&mut self) {
        let registry = match AgentRegistry::load(self.state.paths()) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(error = %e, "monitor: registry load failed");
                return;
            }
        };

        // Add/update targets for agents; drop targets gone from the registry.
        let mut wanted: HashMap<String, String> = HashMap::new();
        for record in registry.iter() {
            if record.agent_type == berth_core::record::AgentType::Agent {
                wanted.insert(record.name.clone(), record.container_name.clone());
            }
        }
        self.targets.retain(|name, target| {
            let keep = wanted.contains_key(name);
            if !keep {
                target.probe_cancel.cancel();
                self.state.health().write().remove(name);
                tracing::info!(agent = %name, "monitor: dropping target");
            }
            keep
        });
        for (name, container) in &wanted {
            self.targets.entry(name.clone()).or_insert_with(|| Target {
                record_name: name.clone(),
                container_name: container.clone(),
                breaker: ContainerBreaker::new(),
                is_restarting: false,
                running_since: None,
                probe: None,
                probe_cancel: CancellationToken::new(),
            });
        }

        let names: Vec<String> = self.targets.keys().cloned().collect();
        for name in names {
            self.check_target(&name, &registry).await;
        }
    }

    async fn check_target(&mut self, name: &str, registry: &AgentRegistry) {
        let Some(target) = self.targets.get_mut(name) else { return };
        if target.breaker.tripped() || target.is_restarting {
            return;
        }

        let running = self
            .state
            .engine()
            .is_running(&target.container_name)
            .await
            .unwrap_or(false);

        if running {
            let since = *target.running_since.get_or_insert_with(Instant::now);
            target.breaker.on_runtime(since.elapsed());
            ensure_probe_worker(&self.state, target);
            return;
        }

        target.running_since = None;
        let Some(record) = registry.get(name) else { return };
        let now = now_ms();
        let Some(delay) = target.breaker.request_restart(now) else {
            if target.breaker.tripped() {
                tracing::error!(agent = %name, "monitor: container breaker tripped");
                self.state.log().log_crash(
                    "container_breaker",
                    &format!("container for '{}' restarted 5 times within 60s", name),
                    serde_json::json!({"agent": name}),
                );
                self.state.health().write().insert(name.to_string(), RouteHealth::Unhealthy);
            }
            return;
        };

        tracing::warn!(agent = %name, ?delay, "monitor: container down, restarting");
        target.is_restarting = true;
        tokio::time::sleep(delay).await;

        let result = async {
            let ctx = lifecycle::context_for_record(self.state.paths(), record, self.router_port)?;
            let sources = berth_workspace::SecretSources::load(&ctx.paths)?;
            let secrets = lifecycle::validate_secrets(&ctx.config.secrets, &sources)?;
            let profile_env = lifecycle::profile_env_pairs(&ctx.config, &sources)?;
            self.manager.ensure_service(&ctx, &secrets, &profile_env).await
        }
        .await;

        if let Some(target) = self.targets.get_mut(name) {
            target.is_restarting = false;
            match result {
                Ok(_) => {
                    target.running_since = Some(Instant::now());
                    tracing::info!(agent = %name, "monitor: container restarted");
                }
                Err(e) => {
                    tracing::error!(agent = %name, error = %e, "monitor: restart failed");
                }
            }
        }
    }
}

/// Make sure a probe worker task is alive for the target.
fn ensure_probe_worker(state: &AppState, target: &mut Target) {
    if target.probe.as_ref().is_some_and(|handle| !handle.is_finished()) {
        return;
    }

    let record_name = target.record_name.clone();
    let container = target.container_name.clone();
    let paths = state.paths().clone();
    let engine = state.engine().clone();
    let health = state.health().clone();
    let cancel = CancellationToken::new();
    target.probe_cancel = cancel.clone();

    target.probe = Some(tokio::spawn(async move {
        // Probes come from the manifest; a registry entry without one means
        // the route is healthy as soon as the container runs.
        let registry = AgentRegistry::load(&paths).ok();
        let record = registry.as_ref().and_then(|r| r.get(&record_name)).cloned();
        let health_spec = record.as_ref().and_then(|record| {
            lifecycle::context_for_record(&paths, record, 0)
                .ok()
                .and_then(|ctx| ctx.config.health)
        });

        let (liveness, readiness) = match health_spec {
            Some(spec) => (spec.liveness, spec.readiness),
            None => (None, None),
        };
        probe_worker(engine, health, record_name, container, liveness, readiness, cancel).await;
    }));
}

/// The per-target probe worker.
async fn probe_worker(
    engine: Engine,
    health: SharedHealth,
    name: String,
    container: String,
    liveness: Option<ProbeSpec>,
    readiness: Option<ProbeSpec>,
    cancel: CancellationToken,
) {
    // Wait for the container to come up.
    let deadline = Instant::now() + PROBE_STARTUP_WAIT;
    while Instant::now() < deadline {
        if cancel.is_cancelled() {
            return;
        }
        if engine.is_running(&container).await.unwrap_or(false) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    if liveness.is_none() && readiness.is_none() {
        health.write().insert(name.clone(), RouteHealth::Healthy);
        return;
    }

    // A declared readiness probe keeps the route dark until it passes.
    if readiness.is_some() {
        health.write().insert(name.clone(), RouteHealth::Unhealthy);
    }

    let mut live_successes = 0u32;
    let mut live_failures = 0u32;
    let mut crash_retries = 0u32;
    let mut liveness_confirmed = liveness.is_none();
    let mut ready_successes = 0u32;
    let mut ready_failures = 0u32;
    let mut running_since = Instant::now();

    let interval = liveness
        .as_ref()
        .or(readiness.as_ref())
        .map(|p| p.interval)
        .unwrap_or(1);

    loop {
        if cancel.is_cancelled() {
            return;
        }

        if running_since.elapsed() >= CRASH_LOOP_RESET {
            crash_retries = 0;
        }

        if let Some(probe) = &liveness {
            match run_probe(&engine, &container, probe).await {
                ProbeOutcome::Pass => {
                    live_successes += 1;
                    live_failures = 0;
                    if live_successes >= probe.success_threshold {
                        liveness_confirmed = true;
                    }
                }
                ProbeOutcome::Fail(output) => {
                    live_failures += 1;
                    live_successes = 0;
                    tracing::warn!(
                        agent = %name,
                        failures = live_failures,
                        threshold = probe.failure_threshold,
                        output = %output,
                        "liveness probe failed"
                    );
                    if live_failures >= probe.failure_threshold {
                        health.write().insert(name.clone(), RouteHealth::Unhealthy);
                        tracing::error!(agent = %name, "liveness threshold crossed, restarting container");
                        if let Err(e) = engine.restart(&container).await {
                            tracing::error!(agent = %name, error = %e, "container restart failed");
                        }
                        let delay = crash_loop_delay(crash_retries);
                        crash_retries += 1;
                        live_failures = 0;
                        liveness_confirmed = false;
                        tracing::info!(agent = %name, ?delay, "crash loop backoff");
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(delay) => {}
                        }
                        running_since = Instant::now();
                        continue;
                    }
                }
            }
        }

        // Readiness only once liveness has been confirmed.
        if liveness_confirmed {
            match &readiness {
                Some(probe) => match run_probe(&engine, &container, probe).await {
                    ProbeOutcome::Pass => {
                        ready_successes += 1;
                        ready_failures = 0;
                        if ready_successes >= probe.success_threshold {
                            health.write().insert(name.clone(), RouteHealth::Healthy);
                        }
                    }
                    ProbeOutcome::Fail(output) => {
                        ready_failures += 1;
                        ready_successes = 0;
                        if ready_failures >= probe.failure_threshold {
                            tracing::warn!(agent = %name, output = %output, "readiness failing, route unhealthy");
                            health.write().insert(name.clone(), RouteHealth::Unhealthy);
                        }
                    }
                },
                None => {
                    health.write().insert(name.clone(), RouteHealth::Healthy);
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
        }
    }
}

enum ProbeOutcome {
    Pass,
    Fail(String),
}

async fn run_probe(engine: &Engine, container: &str, probe: &ProbeSpec) -> ProbeOutcome {
    if !probe.script_is_valid() {
        return ProbeOutcome::Fail(format!("invalid probe script '{}'", probe.script));
    }
    let command = format!("./{}", probe.script);
    let opts = ExecOptions::in_dir("/code").with_timeout(Duration::from_secs(probe.timeout));
    match engine.exec_shell(container, &command, &opts).await {
        Ok(output) if output.success() => ProbeOutcome::Pass,
        Ok(output) => ProbeOutcome::Fail(cap_output(output.stderr)),
        Err(e) => ProbeOutcome::Fail(e.to_string()),
    }
}

/// Bound probe output, staying on a char boundary.
fn cap_output(text: String) -> String {
    if text.len() <= PROBE_OUTPUT_CAP {
        return text;
    }
    let mut end = PROBE_OUTPUT_CAP;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
