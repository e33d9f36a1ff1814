// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent service manager: the idempotent "ensure container" operation.
//!
//! Given an agent context, compose the desired container (labels, env,
//! mounts, ports) and reconcile: reuse a structurally-matching running
//! container, recreate a drifted one, create a missing one. Host sides of
//! every mount are resolved through symlinks first; engine mounts do not
//! follow them.

use crate::error::ProvisionError;
use crate::lifecycle::AgentContext;
use berth_core::naming::labels;
use berth_core::ports::PortSpec;
use berth_engine::{Bind, CreateSpec, Engine, ExecOptions};
use berth_manifest::ProbeSpec;
use berth_workspace::layout::resolve_real;
use std::collections::BTreeSet;
use std::net::TcpListener;
use std::time::{Duration, SystemTime};

/// The standard agent HTTP port inside every container.
pub const AGENT_HTTP_PORT: u16 = 7000;

/// Host-port allocation range for the agent HTTP port.
pub const HOST_PORT_RANGE: (u16, u16) = (10_000, 60_000);

/// Result of an ensure call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOutcome {
    pub container_name: String,
    /// Host port publishing the agent HTTP port.
    pub host_port: u16,
    /// Whether the readiness wait succeeded (always true without a probe).
    pub ready: bool,
}

/// Idempotent container provisioning against one engine.
#[derive(Debug, Clone)]
pub struct AgentServiceManager {
    engine: Engine,
}

impl AgentServiceManager {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Ensure the agent's container exists with the desired shape (created
    /// or reused, not necessarily started).
    pub async fn ensure_created(
        &self,
        ctx: &AgentContext,
        secrets: &[(String, String)],
        profile_env: &[(String, String)],
    ) -> Result<EnsureOutcome, ProvisionError> {
        let name = ctx.container_name.clone();

        // Reuse an existing container when nothing structural changed.
        if let Some(state) = self.engine.state(&name).await? {
            let inspect = self.engine.inspect(&name).await.ok();
            let desired = compose_create_spec(ctx, secrets, profile_env, None)?;
            let matches = inspect
                .as_ref()
                .map(|json| spec_matches_inspect(&desired, json))
                .unwrap_or(false);

            if matches {
                tracing::debug!(container = %name, running = state.running, "container up to date");
                let host_port = self
                    .engine
                    .host_port_for(&name, AGENT_HTTP_PORT)
                    .await?
                    .unwrap_or_default();
                return Ok(EnsureOutcome { container_name: name, host_port, ready: false });
            }

            tracing::info!(container = %name, running = state.running, "recreating drifted container");
            self.engine.stop(&name, None).await.ok();
            self.engine.remove(&name, true).await?;
        }

        // Allocate the agent HTTP host port up front so it can be recorded.
        let host_port = match explicit_agent_port(&ctx.config.ports) {
            Some(port) => port,
            None => allocate_host_port()?,
        };
        let spec = compose_create_spec(ctx, secrets, profile_env, Some(host_port))?;
        self.engine.create(&spec).await?;
        Ok(EnsureOutcome { container_name: name, host_port, ready: false })
    }

    /// Start the (created) container and wait on its readiness probe.
    /// Returns the published host port and whether readiness passed.
    pub async fn start_service(&self, ctx: &AgentContext) -> Result<(u16, bool), ProvisionError> {
        let name = ctx.container_name.as_str();
        if !self.engine.is_running(name).await? {
            self.engine.start(name).await?;
        }
        let host_port =
            self.engine.host_port_for(name, AGENT_HTTP_PORT).await?.unwrap_or_default();
        let ready = self.wait_ready(ctx).await;
        Ok((host_port, ready))
    }

    /// Create + start in one step (the monitor's restart path, where the
    /// after-creation hook has already run in some earlier lifecycle).
    pub async fn ensure_service(
        &self,
        ctx: &AgentContext,
        secrets: &[(String, String)],
        profile_env: &[(String, String)],
    ) -> Result<EnsureOutcome, ProvisionError> {
        let mut outcome = self.ensure_created(ctx, secrets, profile_env).await?;
        let (published, ready) = self.start_service(ctx).await?;
        if published != 0 {
            outcome.host_port = published;
        }
        outcome.ready = ready;
        Ok(outcome)
    }

    /// Stop and remove the agent's container.
    pub async fn teardown(&self, container_name: &str) -> Result<(), ProvisionError> {
        self.engine.stop(container_name, None).await.ok();
        self.engine.remove(container_name, true).await?;
        Ok(())
    }

    /// Poll the readiness probe after start (default 30 attempts × interval).
    ///
    /// Returns `false` on timeout; the caller marks the route unhealthy and
    /// the container monitor flips it once the probe passes.
    async fn wait_ready(&self, ctx: &AgentContext) -> bool {
        let Some(probe) = ctx.config.health.as_ref().and_then(|h| h.readiness.clone()) else {
            return true;
        };
        wait_for_probe(&self.engine, &ctx.container_name, &probe, 30).await
    }
}

/// Run a probe script until it passes or `attempts` runs out.
pub async fn wait_for_probe(
    engine: &Engine,
    container: &str,
    probe: &ProbeSpec,
    attempts: u32,
) -> bool {
    if !probe.script_is_valid() {
        tracing::warn!(container, script = %probe.script, "invalid probe script");
        return false;
    }
    let command = format!("./{}", probe.script);
    let opts = ExecOptions::in_dir("/code").with_timeout(Duration::from_secs(probe.timeout));
    for _ in 0..attempts {
        match engine.exec_shell(container, &command, &opts).await {
            Ok(output) if output.success() => return true,
            Ok(_) | Err(_) => {}
        }
        tokio::time::sleep(Duration::from_secs(probe.interval)).await;
    }
    false
}

/// Explicit host mapping for the agent HTTP port, if the manifest has one.
fn explicit_agent_port(ports: &[PortSpec]) -> Option<u16> {
    ports
        .iter()
        .find(|p| p.container_port == AGENT_HTTP_PORT && p.host_port != 0)
        .map(|p| p.host_port)
}

/// Compose the full create spec for an agent container.
///
/// `agent_host_port` pins the agent HTTP mapping; `None` leaves whatever
/// the manifest declares (used for drift comparison, where the published
/// port is not part of the identity).
pub fn compose_create_spec(
    ctx: &AgentContext,
    secrets: &[(String, String)],
    profile_env: &[(String, String)],
    agent_host_port: Option<u16>,
) -> Result<CreateSpec, ProvisionError> {
    let config = &ctx.config;
    let mut spec = CreateSpec::new(&ctx.container_name, &config.image);

    spec.labels = vec![
        (labels::MANAGED.to_string(), "true".to_string()),
        (labels::AGENT.to_string(), ctx.agent_name.clone()),
        (labels::REPO.to_string(), ctx.repo_name.clone()),
        (labels::PROFILE.to_string(), ctx.profile.to_string()),
    ];

    // Env: profile env, resolved secrets, injected identity, expose.
    let work_dir = ctx.work_dir();
    let mut env: Vec<(String, String)> = Vec::new();
    env.extend(profile_env.iter().cloned());
    env.extend(secrets.iter().cloned());
    env.push(("WORKSPACE_PATH".into(), work_dir.to_string_lossy().into_owned()));
    env.push(("AGENT_NAME".into(), ctx.record_name.clone()));
    env.push(("MODULE_PATH".into(), "/code/modules".into()));
    env.push(("ORCH_MCP_CONFIG_PATH".into(), "/tmp/orch/mcp-config.json".into()));
    env.push(("ORCH_ROUTER_PORT".into(), ctx.router_port.to_string()));

    let host_env: std::collections::HashMap<String, String> = std::env::vars().collect();
    for (name, value) in config.env.expand_wildcards(&host_env) {
        env.push((name, value));
    }
    for (name, value) in config.expose.expand_wildcards(&host_env) {
        env.push((name, value));
    }
    let expose_values = berth_manifest::build_env_values(&config.expose.entries, |name| {
        host_env.get(name).cloned()
    })
    .map_err(|e| ProvisionError::MissingRequiredEnv(e.name))?;
    env.extend(expose_values);
    spec.env = dedup_env(env);

    // Mounts, every host side realpath'd.
    let mut binds = Vec::new();
    if let Some(install) = berth_workspace::paths::install_root() {
        let framework = install.join("framework");
        if framework.is_dir() {
            binds.push(Bind::new(
                resolve_real(&framework).to_string_lossy(),
                "/framework",
                berth_core::profile::MountMode::Ro,
            ));
        }
    }

    let code_source = resolve_real(&ctx.paths.code_link(&ctx.record_name));
    binds.push(Bind::new(code_source.to_string_lossy(), "/code", config.mounts.code));

    // Cwd passthrough: identical absolute path on both sides.
    let work_real = resolve_real(&work_dir);
    binds.push(Bind::new(
        work_real.to_string_lossy(),
        work_real.to_string_lossy(),
        berth_core::profile::MountMode::Rw,
    ));

    // Dual modules mount: one host directory, two container paths.
    let modules = work_real.join("modules");
    let modules_host = modules.to_string_lossy().into_owned();
    binds.push(Bind::new(
        modules_host.clone(),
        "/code/modules",
        berth_core::profile::MountMode::Rw,
    ));
    binds.push(Bind::new(
        modules_host,
        "/framework/modules",
        berth_core::profile::MountMode::Rw,
    ));

    let skills_link = ctx.paths.skills_link(&ctx.record_name);
    if skills_link.exists() {
        binds.push(Bind::new(
            resolve_real(&skills_link).to_string_lossy(),
            "/code/.skills",
            config.mounts.skills,
        ));
    }

    for (host_rel, container_abs) in &config.volumes {
        let host = resolve_real(&work_dir.join(host_rel));
        binds.push(Bind::new(
            host.to_string_lossy(),
            container_abs.clone(),
            berth_core::profile::MountMode::Rw,
        ));
    }
    spec.binds = binds;

    // Ports: manifest mappings, with the agent HTTP port pinned when asked.
    let mut ports = config.ports.clone();
    if let Some(host_port) = agent_host_port {
        match ports.iter_mut().find(|p| p.container_port == AGENT_HTTP_PORT) {
            Some(mapping) if mapping.host_port == 0 => mapping.host_port = host_port,
            Some(_) => {}
            None => ports.push(PortSpec::fixed(host_port, AGENT_HTTP_PORT)),
        }
    } else if !ports.iter().any(|p| p.container_port == AGENT_HTTP_PORT) {
        ports.push(PortSpec::random_host(AGENT_HTTP_PORT));
    }
    spec.ports = ports;

    spec.workdir = Some("/code".to_string());
    spec.command = config.entry_command();
    Ok(spec)
}

fn dedup_env(env: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(env.len());
    for (key, value) in env {
        if let Some(existing) = out.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            out.push((key, value));
        }
    }
    out
}

/// Structural comparison between a desired spec and an `inspect` payload.
///
/// Identity is image, orchestrator labels, and the bind set. Published
/// ports and env are deliberately excluded: ports hold the random
/// allocation and env holds secrets the engine may reorder.
pub fn spec_matches_inspect(desired: &CreateSpec, inspect: &serde_json::Value) -> bool {
    let image = inspect["Config"]["Image"].as_str().unwrap_or_default();
    if image != desired.image {
        return false;
    }

    let inspect_labels = &inspect["Config"]["Labels"];
    for (key, value) in &desired.labels {
        if inspect_labels[key].as_str() != Some(value.as_str()) {
            return false;
        }
    }

    let desired_binds: BTreeSet<String> = desired
        .binds
        .iter()
        .map(|b| format!("{}:{}", b.host, b.container))
        .collect();
    let actual_binds: BTreeSet<String> = inspect["Mounts"]
        .as_array()
        .map(|mounts| {
            mounts
                .iter()
                .filter_map(|m| {
                    let src = m["Source"].as_str()?;
                    let dst = m["Destination"].as_str()?;
                    Some(format!("{}:{}", src, dst))
                })
                .collect()
        })
        .unwrap_or_default();

    desired_binds == actual_binds
}

/// Allocate a free host port in [`HOST_PORT_RANGE`].
///
/// Probes by binding; the engine re-checks at create time, so a rare
/// race surfaces as `PortConflict` and the lifecycle retries.
pub fn allocate_host_port() -> Result<u16, ProvisionError> {
    let (low, high) = HOST_PORT_RANGE;
    let span = (high - low) as u64;
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
        .unwrap_or(0);

    for attempt in 0..200u64 {
        let mixed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(attempt.wrapping_mul(1442695040888963407));
        let candidate = low + (mixed % span) as u16;
        if port_is_free(candidate) {
            return Ok(candidate);
        }
    }
    Err(ProvisionError::NoFreePort(low, high))
}

fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
