// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `berth`: the orchestrator CLI.

mod commands;
mod exit_error;
mod workspace_ctx;

use clap::{Parser, Subcommand};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "berth", version, about = "Local orchestrator for containerized agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a workspace in the current directory
    Init,
    /// Enable agents or repos
    Enable(commands::agent::EnableArgs),
    /// Disable an agent (tears down its container)
    Disable(commands::agent::DisableArgs),
    /// List agents or repos
    List(commands::list::ListArgs),
    /// Start agents, write the routing table, and launch the Router
    Start(commands::start::StartArgs),
    /// Stop the Router and Watchdog
    Stop,
    /// Restart the Router
    Restart(commands::start::RestartArgs),
    /// Stop everything and tear down agent containers
    Shutdown,
    /// Show orchestrator status
    Status,
    /// Manage repositories
    Repo(commands::repo::RepoArgs),
    /// Manage secrets
    Secrets(commands::secrets::SecretsArgs),
    /// Show or set the active profile
    Profile(commands::profile::ProfileArgs),
    /// Read orchestrator logs
    Logs(commands::logs::LogsArgs),
    /// Remove stopped managed containers and refresh the routing table
    Clean,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if std::env::var("ORCH_DEBUG").is_ok() {
            tracing_subscriber::EnvFilter::new("debug")
        } else {
            tracing_subscriber::EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Init => commands::init::run(),
        Command::Enable(args) => commands::agent::enable(args).await,
        Command::Disable(args) => commands::agent::disable(args).await,
        Command::List(args) => commands::list::run(args).await,
        Command::Start(args) => commands::start::start(args).await,
        Command::Stop => commands::start::stop().await,
        Command::Restart(args) => commands::start::restart(args).await,
        Command::Shutdown => commands::start::shutdown().await,
        Command::Status => commands::status::run().await,
        Command::Repo(args) => commands::repo::run(args).await,
        Command::Secrets(args) => commands::secrets::run(args),
        Command::Profile(args) => commands::profile::run(args),
        Command::Logs(args) => commands::logs::run(args),
        Command::Clean => commands::clean::run().await,
    };

    if let Err(error) = result {
        match error.downcast::<ExitError>() {
            Ok(exit) => {
                eprintln!("error: {}", exit.message);
                std::process::exit(exit.code);
            }
            Err(other) => {
                eprintln!("error: {}", other);
                std::process::exit(1);
            }
        }
    }
}
