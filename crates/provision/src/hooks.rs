// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle hook engine: step vocabulary, hook environment, and the
//! host/container hook executors.
//!
//! Hooks run with a merged environment (`ORCH_*` identity variables plus
//! resolved secrets and profile env). Host hook scripts live under the
//! agent's repository directory; absolute paths and `..` segments are
//! rejected before anything touches the filesystem.

use crate::error::ProvisionError;
use berth_engine::{Engine, ExecOptions, ExecOutput};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default hook timeout (host and container).
pub const HOOK_TIMEOUT: Duration = Duration::from_secs(300);

/// The canonical 12 ordered lifecycle steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStep {
    WorkspaceInit,
    Symlinks,
    ContainerCreate,
    HosthookAftercreation,
    ContainerStart,
    CoreDepsInstall,
    AgentDepsInstall,
    Preinstall,
    Install,
    Postinstall,
    HosthookPostinstall,
    AgentReady,
}

impl LifecycleStep {
    pub const ALL: [LifecycleStep; 12] = [
        LifecycleStep::WorkspaceInit,
        LifecycleStep::Symlinks,
        LifecycleStep::ContainerCreate,
        LifecycleStep::HosthookAftercreation,
        LifecycleStep::ContainerStart,
        LifecycleStep::CoreDepsInstall,
        LifecycleStep::AgentDepsInstall,
        LifecycleStep::Preinstall,
        LifecycleStep::Install,
        LifecycleStep::Postinstall,
        LifecycleStep::HosthookPostinstall,
        LifecycleStep::AgentReady,
    ];

    /// 1-based position in the canonical order.
    pub fn number(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).map(|i| i + 1).unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleStep::WorkspaceInit => "workspace init",
            LifecycleStep::Symlinks => "symlinks",
            LifecycleStep::ContainerCreate => "container create",
            LifecycleStep::HosthookAftercreation => "hosthook_aftercreation",
            LifecycleStep::ContainerStart => "container start",
            LifecycleStep::CoreDepsInstall => "core deps install",
            LifecycleStep::AgentDepsInstall => "agent deps install",
            LifecycleStep::Preinstall => "preinstall hook",
            LifecycleStep::Install => "install hook",
            LifecycleStep::Postinstall => "postinstall hook",
            LifecycleStep::HosthookPostinstall => "hosthook_postinstall",
            LifecycleStep::AgentReady => "agent ready",
        }
    }
}

/// Outcome of one lifecycle step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: LifecycleStep,
    pub name: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl StepResult {
    pub fn ok(step: LifecycleStep) -> Self {
        Self { step, name: step.name(), success: true, error: None, output: None }
    }

    pub fn ok_with_output(step: LifecycleStep, output: impl Into<String>) -> Self {
        Self { output: Some(output.into()), ..Self::ok(step) }
    }

    pub fn failed(step: LifecycleStep, error: impl Into<String>) -> Self {
        Self { step, name: step.name(), success: false, error: Some(error.into()), output: None }
    }

    pub fn skipped(step: LifecycleStep, reason: impl Into<String>) -> Self {
        Self::ok_with_output(step, reason)
    }
}

/// Identity handed to every hook.
#[derive(Debug, Clone)]
pub struct HookIdentity {
    pub profile: berth_core::profile::Profile,
    pub agent_name: String,
    pub repo_name: String,
    pub cwd: PathBuf,
    pub container_name: String,
}

/// Build the merged hook environment: `ORCH_*` identity plus resolved
/// secrets and profile env (later entries win).
pub fn hook_env(
    identity: &HookIdentity,
    secrets: &[(String, String)],
    profile_env: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = vec![
        ("ORCH_PROFILE".into(), identity.profile.to_string()),
        ("ORCH_PROFILE_ENV".into(), identity.profile.env_name().to_string()),
        ("ORCH_AGENT_NAME".into(), identity.agent_name.clone()),
        ("ORCH_REPO_NAME".into(), identity.repo_name.clone()),
        ("ORCH_CWD".into(), identity.cwd.to_string_lossy().into_owned()),
        ("ORCH_CONTAINER_NAME".into(), identity.container_name.clone()),
    ];
    let mut upsert = |pairs: &[(String, String)]| {
        for (key, value) in pairs {
            if let Some(existing) = merged.iter_mut().find(|(k, _)| k == key) {
                existing.1 = value.clone();
            } else {
                merged.push((key.clone(), value.clone()));
            }
        }
    };
    upsert(secrets);
    upsert(profile_env);
    merged
}

/// Resolve a host hook script path under `agent_dir`.
///
/// Rejects absolute paths and `..` segments.
pub fn resolve_hook_script(agent_dir: &Path, script: &str) -> Result<PathBuf, ProvisionError> {
    if script.starts_with('/') || script.split('/').any(|part| part == "..") {
        return Err(ProvisionError::HookTraversal(script.to_string()));
    }
    Ok(agent_dir.join(script))
}

/// Run a host hook: chmod 755, spawn with merged env, capture output.
pub async fn run_host_hook(
    agent_dir: &Path,
    script: &str,
    env: &[(String, String)],
    timeout: Duration,
) -> Result<ExecOutput, ProvisionError> {
    let path = resolve_hook_script(agent_dir, script)?;
    if !path.is_file() {
        return Err(ProvisionError::StepFailed {
            step: "host hook",
            detail: format!("script '{}' not found", script),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        std::fs::set_permissions(&path, perms).map_err(|e| ProvisionError::StepFailed {
            step: "host hook",
            detail: format!("chmod failed: {}", e),
        })?;
    }

    let env_map: HashMap<String, String> = env.iter().cloned().collect();
    let mut child = Command::new(&path)
        .current_dir(agent_dir)
        .envs(&env_map)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ProvisionError::StepFailed {
            step: "host hook",
            detail: format!("spawn '{}' failed: {}", script, e),
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| ProvisionError::StepFailed {
            step: "host hook",
            detail: e.to_string(),
        })?,
        Err(_) => {
            return Err(ProvisionError::HookTimeout {
                hook: script.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    };

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a container hook: `engine exec -w /code <container> sh -c "<script>"`.
pub async fn run_container_hook(
    engine: &Engine,
    container: &str,
    script: &str,
    env: &[(String, String)],
    timeout: Duration,
) -> Result<ExecOutput, ProvisionError> {
    let opts = ExecOptions {
        workdir: Some("/code".to_string()),
        env: env.to_vec(),
        timeout: Some(timeout),
    };
    match engine.exec_shell(container, script, &opts).await {
        Ok(output) => Ok(output),
        Err(berth_engine::EngineError::Timeout { .. }) => Err(ProvisionError::HookTimeout {
            hook: script.to_string(),
            seconds: timeout.as_secs(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
