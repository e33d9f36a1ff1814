// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth list agents|repos`.

use crate::workspace_ctx::Ctx;
use anyhow::{anyhow, Result};
use berth_provision::lifecycle::load_workspace_profile;
use berth_workspace::{AgentRegistry, EnabledRepos};
use clap::Args;

#[derive(Args)]
pub struct ListArgs {
    /// What to list: `agents` (default) or `repos`
    #[arg(default_value = "agents")]
    pub kind: String,
}

pub async fn run(args: ListArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    match args.kind.as_str() {
        "agents" => list_agents(&ctx).await,
        "repos" => list_repos(&ctx),
        other => Err(anyhow!("unknown list kind '{}' (expected agents or repos)", other)),
    }
}

async fn list_agents(ctx: &Ctx) -> Result<()> {
    let registry = AgentRegistry::load(&ctx.paths)?;
    if registry.is_empty() {
        println!("No agents enabled. Try `berth enable agent <name>`");
        return Ok(());
    }

    let engine = ctx.engine().ok();
    let profile = load_workspace_profile(&ctx.paths);
    println!("{:<16} {:<20} {:<8} {:<8} {:<10}", "NAME", "SOURCE", "TYPE", "PROFILE", "STATE");
    for record in registry.iter() {
        let state = match &engine {
            Some(engine) => match engine.state(&record.container_name).await {
                Ok(Some(state)) => state.status,
                Ok(None) => "absent".to_string(),
                Err(_) => "unknown".to_string(),
            },
            None => "unknown".to_string(),
        };
        println!(
            "{:<16} {:<20} {:<8} {:<8} {:<10}",
            record.name,
            format!("{}/{}", record.repo_name, record.agent_name),
            record.agent_type.to_string(),
            record.effective_profile(profile).to_string(),
            state,
        );
    }
    Ok(())
}

fn list_repos(ctx: &Ctx) -> Result<()> {
    let repos = ctx.repos();
    let enabled = EnabledRepos::load(&ctx.paths)?;
    let all = repos.list()?;
    if all.is_empty() {
        println!("No repos cloned. Try `berth repo add basic`");
        return Ok(());
    }
    println!("{:<16} {:<9} AGENTS", "REPO", "ENABLED");
    for name in all {
        let agents = repos.discover_agents(&name).unwrap_or_default();
        println!(
            "{:<16} {:<9} {}",
            name,
            if enabled.contains(&name) { "yes" } else { "no" },
            agents.join(", "),
        );
    }
    Ok(())
}
