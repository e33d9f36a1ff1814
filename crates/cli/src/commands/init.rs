// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth init` — create the workspace skeleton in the current directory.

use anyhow::Result;
use berth_workspace::{layout, WorkspacePaths};

pub fn run() -> Result<()> {
    let cwd = std::env::current_dir()?;

    // Re-running init inside an existing workspace is a no-op.
    if let Ok(existing) = WorkspacePaths::discover(&cwd) {
        if existing.root() != cwd {
            println!(
                "Already inside workspace at {} (nested init skipped)",
                existing.root().display()
            );
            return Ok(());
        }
    }

    let paths = WorkspacePaths::at(&cwd);
    layout::ensure_skeleton(&paths)?;
    println!("Initialized berth workspace at {}", cwd.display());
    println!("Next: `berth repo add basic` then `berth enable agent <name>`");
    Ok(())
}
