// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router PID file (`.meta/running/router.pid`).
//!
//! Written by the Watchdog, read by the CLI. Present iff the Router is
//! believed running; staleness is detected with signal 0.

use crate::error::WorkspaceError;
use std::path::Path;

/// Write the PID file, creating the parent directory as needed.
pub fn write(path: &Path, pid: u32) -> Result<(), WorkspaceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    std::fs::write(path, format!("{}\n", pid)).map_err(|e| WorkspaceError::io(path, e))
}

/// Read the recorded PID, `None` when absent or unparseable.
pub fn read(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok().and_then(|s| s.trim().parse().ok())
}

/// Remove the PID file if present.
pub fn remove(path: &Path) {
    let _ = std::fs::remove_file(path);
}

/// Whether a process with this PID is alive (signal 0 probe).
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

/// Read the PID file and check liveness; removes a stale file.
pub fn live_pid(path: &Path) -> Option<u32> {
    let pid = read(path)?;
    if process_alive(pid) {
        Some(pid)
    } else {
        tracing::warn!(pid, path = %path.display(), "stale PID file, removing");
        remove(path);
        None
    }
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
