// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace root discovery and the path map.
//!
//! A workspace is any directory containing a `.meta/` subdirectory. The root
//! is found by walking up from the current directory; `init` creates the
//! marker in place. All orchestrator state lives beneath the root.

use crate::error::WorkspaceError;
use std::path::{Path, PathBuf};

/// Marker directory identifying a workspace root.
pub const META_DIR: &str = ".meta";

/// Path map for one workspace. Cheap to clone; owns only the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    root: PathBuf,
}

impl WorkspacePaths {
    /// Wrap an explicit root without discovery (used by `init` and tests).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover the workspace root by walking up from `start` until a
    /// directory containing `.meta/` is found.
    pub fn discover(start: &Path) -> Result<Self, WorkspaceError> {
        let mut dir = start.to_path_buf();
        loop {
            if dir.join(META_DIR).is_dir() {
                return Ok(Self { root: dir });
            }
            if !dir.pop() {
                return Err(WorkspaceError::NotFound(start.to_path_buf()));
            }
        }
    }

    /// Discover from the process working directory.
    pub fn discover_from_cwd() -> Result<Self, WorkspaceError> {
        let cwd = std::env::current_dir()
            .map_err(|e| WorkspaceError::io(PathBuf::from("."), e))?;
        Self::discover(&cwd)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(META_DIR)
    }

    pub fn agents_file(&self) -> PathBuf {
        self.meta_dir().join("agents.json")
    }

    pub fn enabled_repos_file(&self) -> PathBuf {
        self.meta_dir().join("enabled_repos.json")
    }

    pub fn routing_file(&self) -> PathBuf {
        self.meta_dir().join("routing.json")
    }

    /// Sibling lock file guarding routing-table writes.
    pub fn routing_lock_file(&self) -> PathBuf {
        self.meta_dir().join("routing.lock")
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.meta_dir().join("secrets")
    }

    pub fn servers_file(&self) -> PathBuf {
        self.meta_dir().join("servers.json")
    }

    pub fn profile_file(&self) -> PathBuf {
        self.meta_dir().join("profile")
    }

    pub fn running_dir(&self) -> PathBuf {
        self.meta_dir().join("running")
    }

    pub fn router_pid_file(&self) -> PathBuf {
        self.running_dir().join("router.pid")
    }

    pub fn watchdog_pid_file(&self) -> PathBuf {
        self.running_dir().join("watchdog.pid")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.meta_dir().join("repos")
    }

    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.repos_dir().join(repo)
    }

    pub fn agent_source_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.repo_dir(repo).join(agent)
    }

    pub fn manifest_file(&self, repo: &str, agent: &str) -> PathBuf {
        self.agent_source_dir(repo, agent).join("manifest.json")
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    /// Per-agent read-write working directory, created on enable.
    pub fn agent_work_dir(&self, name: &str) -> PathBuf {
        self.agents_dir().join(name)
    }

    pub fn code_dir(&self) -> PathBuf {
        self.root.join("code")
    }

    /// Symlink to the agent's source under `.meta/repos/...`.
    pub fn code_link(&self, name: &str) -> PathBuf {
        self.code_dir().join(name)
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.root.join("skills")
    }

    pub fn skills_link(&self, name: &str) -> PathBuf {
        self.skills_dir().join(name)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self, channel: &str) -> PathBuf {
        self.logs_dir().join(format!("{}.log", channel))
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.meta_dir().join("blobs")
    }
}

/// Orchestrator installation directory (`ORCH_ROOT` override, else the
/// directory of the running executable's parent).
///
/// This is where framework code mounted at `/framework` lives; it is not
/// the workspace.
pub fn install_root() -> Option<PathBuf> {
    if let Ok(root) = std::env::var("ORCH_ROOT") {
        return Some(PathBuf::from(root));
    }
    std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
