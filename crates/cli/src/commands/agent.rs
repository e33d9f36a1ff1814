// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth enable` / `berth disable` — materialize and tear down agents.

use crate::exit_error::ExitError;
use crate::workspace_ctx::Ctx;
use anyhow::{anyhow, Result};
use berth_core::enable::EnableDirective;
use berth_core::naming::container_name;
use berth_core::record::{AgentRecord, AgentRuntimeConfig};
use berth_manifest::Manifest;
use berth_provision::lifecycle::load_workspace_profile;
use berth_provision::{expand_enable_directives, AgentServiceManager, ProvisionError};
use berth_workspace::{layout, AgentRegistry};
use chrono::Utc;
use clap::Args;

#[derive(Args)]
pub struct EnableArgs {
    /// What to enable: `agent` or `repo`
    pub kind: String,
    /// Enable directive: `NAME [MODE] [REPO] ['as' ALIAS]`
    #[arg(trailing_var_arg = true, required = true)]
    pub directive: Vec<String>,
}

#[derive(Args)]
pub struct DisableArgs {
    /// Agent record name
    pub name: String,
}

pub async fn enable(args: EnableArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    match args.kind.as_str() {
        "repo" => {
            let name = args
                .directive
                .first()
                .ok_or_else(|| anyhow!("usage: berth enable repo <name>"))?;
            let repos = ctx.repos();
            repos.add(name, None).await?;
            repos.enable(name)?;
            println!("Repo '{}' enabled", name);
            Ok(())
        }
        "agent" => enable_agents(&ctx, &args.directive.join(" ")).await,
        other => Err(anyhow!("unknown enable kind '{}' (expected agent or repo)", other)),
    }
}

async fn enable_agents(ctx: &Ctx, directive: &str) -> Result<()> {
    let root: EnableDirective = directive
        .parse()
        .map_err(|e| ExitError::new(2, format!("invalid directive '{}': {}", directive, e)))?;

    layout::ensure_skeleton(&ctx.paths)?;
    let repos = ctx.repos();

    // Clone repos the root's manifest asks for, then expand recursively.
    let expanded = expand_enable_directives(
        &[root],
        |name| repos.find_agent(name),
        |repo, agent| {
            let manifest = Manifest::load(&ctx.paths.manifest_file(repo, agent))?;
            Ok(manifest)
        },
    )?;

    // Bring in any additional repos named by the expanded manifests.
    for (_, repo, agent) in &expanded {
        let manifest = Manifest::load(&ctx.paths.manifest_file(repo, agent))?;
        for extra in &manifest.repos {
            repos.add(extra, None).await?;
            repos.enable(extra)?;
        }
    }

    let mut registry = AgentRegistry::load(&ctx.paths)?;
    let workspace_profile = load_workspace_profile(&ctx.paths);

    for (directive, repo, agent) in expanded {
        let manifest_path = ctx.paths.manifest_file(&repo, &agent);
        let manifest = Manifest::load(&manifest_path)?;
        if let Err(report) =
            berth_manifest::validate(&manifest, Some(&ctx.paths.agent_source_dir(&repo, &agent)))
        {
            return Err(ExitError::new(2, report.to_string()).into());
        }

        let record_name = directive.record_name().to_string();
        if let Some(existing) = registry.get(&record_name) {
            if existing.repo_name != repo || existing.agent_name != agent {
                return Err(ExitError::new(
                    2,
                    format!(
                        "name '{}' already enabled for {}/{}; pick an alias: \
                         berth enable agent {} as <alias>",
                        record_name, existing.repo_name, existing.agent_name, agent
                    ),
                )
                .into());
            }
            println!("Agent '{}' already enabled", record_name);
            continue;
        }

        let profile = manifest
            .default_profile
            .as_deref()
            .and_then(|p| p.parse().ok())
            .filter(|&p| p != workspace_profile);

        let image = manifest
            .image_uri()
            .ok_or_else(|| anyhow!("manifest for {}/{} declares no image", repo, agent))?
            .to_string();

        let record = AgentRecord {
            name: record_name.clone(),
            repo_name: repo.clone(),
            agent_name: agent.clone(),
            container_image: image,
            container_name: container_name(&repo, &agent, ctx.paths.root()),
            run_mode: directive.mode.unwrap_or_default(),
            agent_type: manifest.agent_type,
            profile,
            created_at: Utc::now(),
            config: AgentRuntimeConfig::default(),
        };

        // Working directory and symlinks come up at enable time so the
        // user can inspect them before anything starts.
        std::fs::create_dir_all(ctx.paths.agent_work_dir(&record_name))?;
        let source = ctx.paths.agent_source_dir(&repo, &agent);
        layout::create_symlink(&source, &ctx.paths.code_link(&record_name))?;
        let skills = source.join("skills");
        if skills.is_dir() {
            layout::create_symlink(&skills, &ctx.paths.skills_link(&record_name))?;
        }

        registry.upsert(record);
        println!("Agent '{}' enabled ({}/{})", record_name, repo, agent);
    }

    registry.save(&ctx.paths)?;
    Ok(())
}

pub async fn disable(args: DisableArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    let mut registry = AgentRegistry::load(&ctx.paths)?;
    let Some(record) = registry.remove(&args.name) else {
        return Err(ExitError::new(
            1,
            format!("no enabled agent '{}'. See `berth list agents`", args.name),
        )
        .into());
    };

    // Disable must tear down the container.
    match ctx.engine() {
        Ok(engine) => {
            let manager = AgentServiceManager::new(engine);
            if let Err(e) = manager.teardown(&record.container_name).await {
                match e {
                    ProvisionError::Engine(berth_engine::EngineError::NotFound(_)) => {}
                    other => tracing::warn!(error = %other, "container teardown failed"),
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "engine unavailable, skipping teardown"),
    }

    layout::remove_symlink(&ctx.paths.code_link(&args.name)).ok();
    layout::remove_symlink(&ctx.paths.skills_link(&args.name)).ok();
    registry.save(&ctx.paths)?;
    println!("Agent '{}' disabled", args.name);
    Ok(())
}
