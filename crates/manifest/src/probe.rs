// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health probe specs (`health.liveness`, `health.readiness`).

use serde::{Deserialize, Serialize};

fn default_interval() -> u64 {
    1
}
fn default_timeout() -> u64 {
    5
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_success_threshold() -> u32 {
    1
}

/// One probe: a script executed inside the container at an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    /// Script path relative to `/code`; must be a bare name (no `/`, `..`).
    pub script: String,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

impl ProbeSpec {
    /// Path-traversal guard on the script name.
    pub fn script_is_valid(&self) -> bool {
        !self.script.is_empty() && !self.script.contains('/') && !self.script.contains("..")
    }
}

/// The manifest `health` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<ProbeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ProbeSpec>,
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
