// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth repo` — repository management.

use crate::workspace_ctx::Ctx;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand)]
pub enum RepoCommand {
    /// Clone a repo (predefined name or explicit URL)
    Add {
        name: String,
        /// Git URL (defaults to the predefined map for known names)
        url: Option<String>,
    },
    /// Add a repo to the enabled set
    Enable { name: String },
    /// Remove a repo from the enabled set (clone is kept)
    Disable { name: String },
    /// Pull the latest changes
    Update { name: String },
    /// Disable and delete the clone
    Remove { name: String },
}

pub async fn run(args: RepoArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    let repos = ctx.repos();
    match args.command {
        RepoCommand::Add { name, url } => {
            let dir = repos.add(&name, url.as_deref()).await?;
            repos.enable(&name)?;
            println!("Repo '{}' at {}", name, dir.display());
        }
        RepoCommand::Enable { name } => {
            if repos.enable(&name)? {
                println!("Repo '{}' enabled", name);
            } else {
                println!("Repo '{}' was already enabled", name);
            }
        }
        RepoCommand::Disable { name } => {
            if repos.disable(&name)? {
                println!("Repo '{}' disabled", name);
            } else {
                println!("Repo '{}' was not enabled", name);
            }
        }
        RepoCommand::Update { name } => {
            repos.update(&name).await?;
            println!("Repo '{}' updated", name);
        }
        RepoCommand::Remove { name } => {
            repos.remove(&name)?;
            println!("Repo '{}' removed", name);
        }
    }
    Ok(())
}
