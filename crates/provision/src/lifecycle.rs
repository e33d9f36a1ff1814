// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The 12-step lifecycle driver.
//!
//! Steps run strictly in order; every step is attempted and reported even
//! after earlier failures, except steps that require prior success (a
//! failed container create skips the in-container steps). Secret
//! validation happens before any container hook (step 8) runs.

use crate::error::ProvisionError;
use crate::hooks::{
    self, HookIdentity, LifecycleStep, StepResult, HOOK_TIMEOUT,
};
use crate::installer;
use crate::service::{AgentServiceManager, EnsureOutcome};
use berth_core::profile::Profile;
use berth_manifest::{build_env_values, EffectiveConfig};
use berth_workspace::{layout, SecretSources, WorkspacePaths};
use std::path::PathBuf;

/// Everything the lifecycle needs to know about one agent.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub record_name: String,
    pub repo_name: String,
    pub agent_name: String,
    pub container_name: String,
    pub profile: Profile,
    pub config: EffectiveConfig,
    pub paths: WorkspacePaths,
    /// Router listen port, injected as `ORCH_ROUTER_PORT`.
    pub router_port: u16,
}

impl AgentContext {
    /// Agent working directory (`agents/<name>`), the cwd passthrough.
    pub fn work_dir(&self) -> PathBuf {
        self.paths.agent_work_dir(&self.record_name)
    }

    /// Agent source inside the repo clone.
    pub fn source_dir(&self) -> PathBuf {
        self.paths.agent_source_dir(&self.repo_name, &self.agent_name)
    }

    pub fn hook_identity(&self) -> HookIdentity {
        HookIdentity {
            profile: self.profile,
            agent_name: self.agent_name.clone(),
            repo_name: self.repo_name.clone(),
            cwd: self.work_dir(),
            container_name: self.container_name.clone(),
        }
    }
}

/// Aggregated outcome of one lifecycle run.
#[derive(Debug)]
pub struct LifecycleResult {
    pub steps: Vec<StepResult>,
    pub outcome: Option<EnsureOutcome>,
}

impl LifecycleResult {
    pub fn success(&self) -> bool {
        self.steps.iter().all(|s| s.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.success)
    }
}

/// Active workspace profile (`.meta/profile`, default `dev`).
pub fn load_workspace_profile(paths: &WorkspacePaths) -> Profile {
    std::fs::read_to_string(paths.profile_file())
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or_default()
}

/// Build an [`AgentContext`] for a persisted record.
pub fn context_for_record(
    paths: &WorkspacePaths,
    record: &berth_core::record::AgentRecord,
    router_port: u16,
) -> Result<AgentContext, ProvisionError> {
    let manifest = berth_manifest::Manifest::load(
        &paths.manifest_file(&record.repo_name, &record.agent_name),
    )?;
    let profile = record.effective_profile(load_workspace_profile(paths));
    let config = berth_manifest::effective::resolve(&manifest, profile)?;
    Ok(AgentContext {
        record_name: record.name.clone(),
        repo_name: record.repo_name.clone(),
        agent_name: record.agent_name.clone(),
        container_name: record.container_name.clone(),
        profile,
        config,
        paths: paths.clone(),
        router_port,
    })
}

/// Validate that every declared secret resolves in some source.
pub fn validate_secrets(
    required: &[String],
    sources: &SecretSources,
) -> Result<Vec<(String, String)>, ProvisionError> {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    for name in required {
        match sources.get(name) {
            Some(value) => resolved.push((name.clone(), value)),
            None => missing.push(name.clone()),
        }
    }
    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(ProvisionError::MissingSecrets { missing })
    }
}

/// Build the profile env pairs for hooks from the effective config.
pub fn profile_env_pairs(
    config: &EffectiveConfig,
    sources: &SecretSources,
) -> Result<Vec<(String, String)>, ProvisionError> {
    build_env_values(&config.env.entries, |name| sources.get(name))
        .map_err(|e| ProvisionError::MissingRequiredEnv(e.name))
}

/// Run the canonical 12 steps for one agent.
pub async fn run_lifecycle(
    manager: &AgentServiceManager,
    ctx: &AgentContext,
) -> Result<LifecycleResult, ProvisionError> {
    let mut result = LifecycleResult { steps: Vec::new(), outcome: None };

    // Secrets are validated up front: a missing secret aborts the whole run
    // before any container hook could observe a partial environment.
    let sources = SecretSources::load(&ctx.paths)?;
    let secrets = validate_secrets(&ctx.config.secrets, &sources)?;
    let profile_env = profile_env_pairs(&ctx.config, &sources)?;
    let hook_env = hooks::hook_env(&ctx.hook_identity(), &secrets, &profile_env);

    // Step 1: workspace init.
    let step = match layout::ensure_skeleton(&ctx.paths)
        .and_then(|_| {
            std::fs::create_dir_all(ctx.work_dir()).map_err(|e| {
                berth_workspace::WorkspaceError::Io { path: ctx.work_dir(), source: e }
            })
        }) {
        Ok(_) => StepResult::ok(LifecycleStep::WorkspaceInit),
        Err(e) => StepResult::failed(LifecycleStep::WorkspaceInit, e.to_string()),
    };
    result.steps.push(step);

    // Step 2: symlinks.
    result.steps.push(create_links(ctx));

    // Step 3: container create (service manager, idempotent).
    let created = manager.ensure_created(ctx, &secrets, &profile_env).await;
    let mut outcome = match created {
        Ok(outcome) => {
            result.steps.push(StepResult::ok_with_output(
                LifecycleStep::ContainerCreate,
                outcome.container_name.clone(),
            ));
            Some(outcome)
        }
        Err(e) => {
            result.steps.push(StepResult::failed(LifecycleStep::ContainerCreate, e.to_string()));
            None
        }
    };

    // Step 4: hosthook_aftercreation, between create and start.
    result.steps.push(
        run_optional_host_hook(
            ctx,
            LifecycleStep::HosthookAftercreation,
            ctx.config.hosthook_aftercreation.as_deref(),
            &hook_env,
        )
        .await,
    );

    // Step 5: container start + readiness wait.
    let container_up = if outcome.is_some() {
        match manager.start_service(ctx).await {
            Ok((host_port, ready)) => {
                if let Some(outcome) = outcome.as_mut() {
                    if host_port != 0 {
                        outcome.host_port = host_port;
                    }
                    outcome.ready = ready;
                }
                result.steps.push(StepResult::ok(LifecycleStep::ContainerStart));
                true
            }
            Err(e) => {
                result.steps.push(StepResult::failed(LifecycleStep::ContainerStart, e.to_string()));
                false
            }
        }
    } else {
        result.steps.push(StepResult::failed(
            LifecycleStep::ContainerStart,
            "skipped: container create failed".to_string(),
        ));
        false
    };

    // Steps 6-10 need a running container.
    if container_up {
        let container = ctx.container_name.as_str();
        let engine = manager.engine();

        // Step 6: core toolchain.
        let step = match installer::ensure_toolchain(engine, container).await {
            Ok(_) => StepResult::ok(LifecycleStep::CoreDepsInstall),
            Err(e) => StepResult::failed(LifecycleStep::CoreDepsInstall, e.to_string()),
        };
        let core_ok = step.success;
        result.steps.push(step);

        // Step 7: merged dependency install.
        if core_ok {
            let step = match installer::install_dependencies(
                engine,
                container,
                &ctx.config,
                &ctx.source_dir(),
                &ctx.work_dir(),
            )
            .await
            {
                Ok(_) => StepResult::ok(LifecycleStep::AgentDepsInstall),
                Err(e) => StepResult::failed(LifecycleStep::AgentDepsInstall, e.to_string()),
            };
            result.steps.push(step);
        } else {
            result.steps.push(StepResult::failed(
                LifecycleStep::AgentDepsInstall,
                "skipped: toolchain install failed".to_string(),
            ));
        }

        // Steps 8-10: container hooks.
        for (step, commands) in [
            (LifecycleStep::Preinstall, &ctx.config.preinstall),
            (LifecycleStep::Install, &ctx.config.install),
            (LifecycleStep::Postinstall, &ctx.config.postinstall),
        ] {
            result
                .steps
                .push(run_container_commands(manager, ctx, step, commands, &hook_env).await);
        }
    } else {
        for step in [
            LifecycleStep::CoreDepsInstall,
            LifecycleStep::AgentDepsInstall,
            LifecycleStep::Preinstall,
            LifecycleStep::Install,
            LifecycleStep::Postinstall,
        ] {
            result
                .steps
                .push(StepResult::failed(step, "skipped: container not running".to_string()));
        }
    }

    // Step 11: hosthook_postinstall.
    result.steps.push(
        run_optional_host_hook(
            ctx,
            LifecycleStep::HosthookPostinstall,
            ctx.config.hosthook_postinstall.as_deref(),
            &hook_env,
        )
        .await,
    );

    // Step 12: ready marker.
    if result.steps.iter().all(|s| s.success) {
        result.steps.push(StepResult::ok(LifecycleStep::AgentReady));
    } else {
        result.steps.push(StepResult::failed(
            LifecycleStep::AgentReady,
            "earlier steps failed".to_string(),
        ));
    }

    result.outcome = outcome;
    Ok(result)
}

fn create_links(ctx: &AgentContext) -> StepResult {
    let source = ctx.source_dir();
    let code_link = ctx.paths.code_link(&ctx.record_name);
    if let Err(e) = layout::create_symlink(&source, &code_link) {
        return StepResult::failed(LifecycleStep::Symlinks, e.to_string());
    }

    // Skills link only when the agent ships a skills directory.
    let skills_source = source.join("skills");
    if skills_source.is_dir() {
        let skills_link = ctx.paths.skills_link(&ctx.record_name);
        if let Err(e) = layout::create_symlink(&skills_source, &skills_link) {
            return StepResult::failed(LifecycleStep::Symlinks, e.to_string());
        }
    }
    StepResult::ok(LifecycleStep::Symlinks)
}

async fn run_optional_host_hook(
    ctx: &AgentContext,
    step: LifecycleStep,
    script: Option<&str>,
    env: &[(String, String)],
) -> StepResult {
    let Some(script) = script else {
        return StepResult::skipped(step, "no hook declared");
    };
    match hooks::run_host_hook(&ctx.source_dir(), script, env, HOOK_TIMEOUT).await {
        Ok(output) if output.success() => StepResult::ok_with_output(step, output.stdout),
        Ok(output) => StepResult::failed(
            step,
            format!("exit {}: {}", output.exit_code, output.stderr.trim()),
        ),
        Err(e) => StepResult::failed(step, e.to_string()),
    }
}

async fn run_container_commands(
    manager: &AgentServiceManager,
    ctx: &AgentContext,
    step: LifecycleStep,
    commands: &[String],
    env: &[(String, String)],
) -> StepResult {
    if commands.is_empty() {
        return StepResult::skipped(step, "no hook declared");
    }
    let mut outputs = Vec::new();
    for command in commands {
        match hooks::run_container_hook(
            manager.engine(),
            &ctx.container_name,
            command,
            env,
            HOOK_TIMEOUT,
        )
        .await
        {
            Ok(output) if output.success() => outputs.push(output.stdout),
            Ok(output) => {
                return StepResult::failed(
                    step,
                    format!("`{}` exit {}: {}", command, output.exit_code, output.stderr.trim()),
                )
            }
            Err(e) => return StepResult::failed(step, e.to_string()),
        }
    }
    StepResult::ok_with_output(step, outputs.join(""))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
