// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency installer.
//!
//! Runs inside the target container over the cwd-passthrough mount, so the
//! resulting `modules` directory persists on the host and is dual-mounted
//! at `/code/modules` and `/framework/modules`. The package manager only
//! knows `node_modules`, so install writes through a `node_modules`
//! symlink into `modules`.

use crate::error::ProvisionError;
use berth_engine::{Engine, ExecOptions};
use berth_manifest::EffectiveConfig;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;

/// Timeout for the in-container package install.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Core dependencies pinned for every agent. Used when the installation's
/// template file is absent.
const CORE_TEMPLATE: &str = r#"{
  "name": "agent-workspace",
  "private": true,
  "dependencies": {
    "@berth/agent-kit": "1.4.2",
    "express": "4.19.2",
    "ws": "8.17.0"
  }
}"#;

/// Why an installation was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSkip {
    /// Start-entry-point agent without package metadata.
    NoPackageMetadata,
    /// Host-side cache is warm (non-empty modules directory).
    CacheWarm,
}

/// Host-side skip decision, checked before any container work.
pub fn install_skip_reason(
    config: &EffectiveConfig,
    agent_source_dir: &Path,
    work_dir: &Path,
) -> Option<InstallSkip> {
    let has_metadata = agent_source_dir.join("package.json").is_file();
    if !has_metadata && config.uses_start_entry() {
        return Some(InstallSkip::NoPackageMetadata);
    }
    let modules = work_dir.join("modules");
    let warm = std::fs::read_dir(&modules)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if warm {
        return Some(InstallSkip::CacheWarm);
    }
    None
}

/// Load the core package template from the installation's templates dir,
/// falling back to the built-in pin set.
pub fn core_template(install_root: Option<&Path>) -> Value {
    if let Some(root) = install_root {
        let path = root.join("templates/package.json");
        if let Ok(raw) = std::fs::read_to_string(&path) {
            if let Ok(value) = serde_json::from_str(&raw) {
                return value;
            }
            tracing::warn!(path = %path.display(), "malformed core template, using built-in");
        }
    }
    serde_json::from_str(CORE_TEMPLATE).unwrap_or_else(|_| json!({}))
}

/// Merge core and agent package metadata.
///
/// Core dependencies override the agent's for the pinned set; the agent's
/// name, scripts, and devDependencies are preserved.
pub fn merge_package_metadata(core: &Value, agent: Option<&Value>) -> Value {
    let Some(agent) = agent else { return core.clone() };

    let mut merged: Map<String, Value> =
        agent.as_object().cloned().unwrap_or_default();

    // Dependencies: agent's extended with core's, core pins winning.
    let mut deps: Map<String, Value> = agent
        .get("dependencies")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if let Some(core_deps) = core.get("dependencies").and_then(Value::as_object) {
        for (name, version) in core_deps {
            deps.insert(name.clone(), version.clone());
        }
    }
    merged.insert("dependencies".to_string(), Value::Object(deps));

    // Everything in core other than dependencies fills gaps only.
    if let Some(core_object) = core.as_object() {
        for (key, value) in core_object {
            if key == "dependencies" {
                continue;
            }
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    Value::Object(merged)
}

/// Ensure the build toolchain exists in the container.
///
/// Probes for `git`, a C compiler, `python3`, and `make`; when anything is
/// missing, tries the known package managers in order.
pub async fn ensure_toolchain(engine: &Engine, container: &str) -> Result<(), ProvisionError> {
    let probe = "command -v git >/dev/null && (command -v cc >/dev/null || command -v gcc >/dev/null) \
                 && command -v python3 >/dev/null && command -v make >/dev/null";
    let opts = ExecOptions::default().with_timeout(Duration::from_secs(30));
    let present = engine.exec_shell(container, probe, &opts).await?;
    if present.success() {
        return Ok(());
    }

    tracing::info!(container, "build toolchain missing, installing");
    let installers = [
        "apk add --no-cache git build-base python3 make",
        "apt-get update && apt-get install -y git build-essential python3 make",
        "dnf install -y git gcc python3 make",
    ];
    let opts = ExecOptions::default().with_timeout(Duration::from_secs(300));
    for command in installers {
        let result = engine.exec_shell(container, command, &opts).await?;
        if result.success() {
            return Ok(());
        }
    }
    Err(ProvisionError::StepFailed {
        step: "core deps install",
        detail: "could not install build toolchain with any known package manager".to_string(),
    })
}

/// Run the full in-container installation sequence.
///
/// `work_dir` is the agent working directory as an absolute path valid on
/// both sides of the cwd passthrough.
pub async fn install_dependencies(
    engine: &Engine,
    container: &str,
    config: &EffectiveConfig,
    agent_source_dir: &Path,
    work_dir: &Path,
) -> Result<(), ProvisionError> {
    if let Some(skip) = install_skip_reason(config, agent_source_dir, work_dir) {
        tracing::info!(container, ?skip, "skipping dependency install");
        return Ok(());
    }

    ensure_toolchain(engine, container).await?;

    let work = work_dir.to_string_lossy();
    // The modules dir is the dual-mounted dependency directory; npm writes
    // into it through the node_modules symlink.
    let prepare = format!(
        "mkdir -p '{work}/modules' && ln -sfn modules '{work}/node_modules'",
        work = work
    );
    let opts = ExecOptions::default().with_timeout(Duration::from_secs(30));
    let result = engine.exec_shell(container, &prepare, &opts).await?;
    if !result.success() {
        return Err(ProvisionError::StepFailed {
            step: "agent deps install",
            detail: format!("work dir setup failed: {}", result.stderr.trim()),
        });
    }

    let core = core_template(berth_workspace::paths::install_root().as_deref());
    let agent_metadata = std::fs::read_to_string(agent_source_dir.join("package.json"))
        .ok()
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
    let merged = merge_package_metadata(&core, agent_metadata.as_ref());

    let package_path = format!("{}/package.json", work);
    let payload = serde_json::to_vec_pretty(&merged).unwrap_or_default();
    engine.write_file(container, &package_path, &payload).await?;

    let install_cmd = "npm install --no-audit --no-fund";
    let opts = ExecOptions::in_dir(work.to_string()).with_timeout(INSTALL_TIMEOUT);
    let result = match engine.exec_shell(container, install_cmd, &opts).await {
        Ok(result) => result,
        Err(berth_engine::EngineError::Timeout { .. }) => {
            return Err(ProvisionError::HookTimeout {
                hook: install_cmd.to_string(),
                seconds: INSTALL_TIMEOUT.as_secs(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    if !result.success() {
        return Err(ProvisionError::StepFailed {
            step: "agent deps install",
            detail: format!("npm install exited {}: {}", result.exit_code, result.stderr.trim()),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "installer_tests.rs"]
mod tests;
