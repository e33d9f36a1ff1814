// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth clean` — remove stopped managed containers and refresh the
//! routing table.

use crate::commands::routing;
use crate::workspace_ctx::Ctx;
use anyhow::Result;
use std::collections::HashMap;

pub async fn run() -> Result<()> {
    let ctx = Ctx::discover()?;
    let engine = ctx.engine()?;

    let mut removed = 0usize;
    for name in engine.ps(true).await? {
        if !engine.is_running(&name).await.unwrap_or(false) {
            engine.remove(&name, true).await?;
            println!("Removed stopped container {}", name);
            removed += 1;
        }
    }

    let port = ctx.router_port(None);
    let table = routing::regenerate(&ctx.paths, &engine, port, &HashMap::new()).await?;
    println!(
        "Cleaned {} container(s); routing table now has {} route(s)",
        removed,
        table.routes.len()
    );
    Ok(())
}
