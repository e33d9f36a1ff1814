// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth profile` — show or set the active workspace profile.

use crate::exit_error::ExitError;
use crate::workspace_ctx::Ctx;
use anyhow::Result;
use berth_core::profile::Profile;
use berth_provision::lifecycle::load_workspace_profile;
use clap::Args;

#[derive(Args)]
pub struct ProfileArgs {
    /// Profile to activate (`dev`, `qa`, or `prod`); prints the active one
    /// when omitted
    pub name: Option<String>,
}

pub fn run(args: ProfileArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    match args.name {
        None => {
            println!("{}", load_workspace_profile(&ctx.paths));
            Ok(())
        }
        Some(name) => {
            let profile: Profile = name
                .parse()
                .map_err(|e: berth_core::profile::UnknownProfile| ExitError::new(2, e.to_string()))?;
            std::fs::write(ctx.paths.profile_file(), format!("{}\n", profile))?;
            println!("Active profile: {}", profile);
            println!("Restart agents to apply: `berth restart`");
            Ok(())
        }
    }
}
