// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic container naming and the managed-container label set.
//!
//! Container names are a pure function of (repo, agent, workspace path):
//! stable across restarts, unique per workspace. All containers created by
//! the orchestrator carry `orch=true` plus identity labels; every listing
//! operation filters on `orch=true`.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Label keys stamped onto every managed container.
pub mod labels {
    /// Marker label: `orch=true`. Listing operations filter on this.
    pub const MANAGED: &str = "orch";
    /// Agent name label.
    pub const AGENT: &str = "orch.agent";
    /// Repository name label.
    pub const REPO: &str = "orch.repo";
    /// Active profile label.
    pub const PROFILE: &str = "orch.profile";

    /// The `key=value` filter string for listing managed containers.
    pub const MANAGED_FILTER: &str = "orch=true";
}

/// Stable 8-hex digest of a workspace path.
///
/// Two workspaces at different paths get different hashes; the same
/// workspace always gets the same hash.
pub fn project_hash8(workspace_root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workspace_root.as_os_str().as_encoded_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Deterministic container name: `orch_<repo>_<agent>_<hash8>`.
pub fn container_name(repo: &str, agent: &str, workspace_root: &Path) -> String {
    format!("orch_{}_{}_{}", repo, agent, project_hash8(workspace_root))
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
