// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth logs` — read orchestrator log channels.

use crate::workspace_ctx::Ctx;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Subcommand)]
pub enum LogsCommand {
    /// Follow a channel (`router`, `watchdog`, ...)
    Tail {
        #[arg(default_value = "router")]
        channel: String,
    },
    /// Print the last N lines of a channel
    Last {
        #[arg(default_value = "router")]
        channel: String,
        /// Number of lines
        #[arg(short = 'n', long, default_value = "200")]
        lines: usize,
    },
}

pub fn run(args: LogsArgs) -> Result<()> {
    let ctx = Ctx::discover()?;
    match args.command {
        LogsCommand::Tail { channel } => {
            let path = ctx.paths.log_file(&channel);
            if !path.exists() {
                println!("No log file at {}", path.display());
                return Ok(());
            }
            println!("Following {} (ctrl-c to stop)", path.display());
            berth_logs::tail_follow(&path, |line| {
                println!("{}", line);
                true
            })?;
            Ok(())
        }
        LogsCommand::Last { channel, lines } => {
            let path = ctx.paths.log_file(&channel);
            if !path.exists() {
                println!("No log file at {}", path.display());
                return Ok(());
            }
            let content = berth_logs::last_lines(&path, lines)?;
            println!("{}", content.trim_end());
            Ok(())
        }
    }
}
