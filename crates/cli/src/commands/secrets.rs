// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth secrets` — manage the workspace secrets file.
//!
//! Values are never printed; `list` shows names and whether each value is
//! a literal or a `$alias`.

use crate::workspace_ctx::Ctx;
use anyhow::Result;
use berth_workspace::SecretsFile;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand)]
pub enum SecretsCommand {
    /// Set a secret (`$OTHER` values alias another key)
    Set { name: String, value: String },
    /// Remove a secret
    Unset { name: String },
    /// List secret names
    List,
}

pub fn run(args: SecretsArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    let path = ctx.paths.secrets_file();
    let mut file = SecretsFile::load(&path)?;

    match args.command {
        SecretsCommand::Set { name, value } => {
            file.set(&name, &value);
            file.save(&path)?;
            println!("Secret '{}' set", name);
        }
        SecretsCommand::Unset { name } => {
            if file.remove(&name) {
                file.save(&path)?;
                println!("Secret '{}' removed", name);
            } else {
                println!("No secret '{}'", name);
            }
        }
        SecretsCommand::List => {
            let names: Vec<&str> = file.keys().collect();
            if names.is_empty() {
                println!("No secrets. Try `berth secrets set NAME value`");
                return Ok(());
            }
            for name in names {
                let kind = match file.raw(name) {
                    Some(value) if value.starts_with('$') => format!("alias → {}", &value[1..]),
                    _ => "literal".to_string(),
                };
                println!("{:<32} {}", name, kind);
            }
        }
    }
    Ok(())
}
