// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository manager.
//!
//! A repo is a Git clone under `.meta/repos/<name>/`; each top-level
//! subdirectory containing a `manifest.json` is an agent. A small built-in
//! map resolves bare `add <name>` to a canonical URL.

use crate::error::ProvisionError;
use berth_workspace::{EnabledRepos, WorkspacePaths};
use std::path::PathBuf;
use tokio::process::Command;

/// Named predefined repositories for bare `repo add <name>`.
pub const PREDEFINED_REPOS: &[(&str, &str)] = &[
    ("basic", "https://github.com/berth-agents/basic.git"),
    ("cloud", "https://github.com/berth-agents/cloud.git"),
    ("security", "https://github.com/berth-agents/security.git"),
    ("extra", "https://github.com/berth-agents/extra.git"),
    ("demo", "https://github.com/berth-agents/demo.git"),
];

/// Resolve a predefined repo name to its URL.
pub fn predefined_url(name: &str) -> Option<&'static str> {
    PREDEFINED_REPOS.iter().find(|(n, _)| *n == name).map(|(_, url)| *url)
}

/// Git-backed repository manager rooted at `.meta/repos/`.
#[derive(Debug, Clone)]
pub struct RepoManager {
    paths: WorkspacePaths,
}

impl RepoManager {
    pub fn new(paths: WorkspacePaths) -> Self {
        Self { paths }
    }

    /// Clone a repo if missing. `url` falls back to the predefined map.
    pub async fn add(&self, name: &str, url: Option<&str>) -> Result<PathBuf, ProvisionError> {
        let dir = self.paths.repo_dir(name);
        if dir.is_dir() {
            tracing::debug!(repo = name, "repo already present");
            return Ok(dir);
        }

        let url = match url {
            Some(url) => url.to_string(),
            None => predefined_url(name)
                .map(str::to_string)
                .ok_or_else(|| ProvisionError::UnknownRepo(name.to_string()))?,
        };

        std::fs::create_dir_all(self.paths.repos_dir())
            .map_err(|e| berth_workspace::WorkspaceError::Io {
                path: self.paths.repos_dir(),
                source: e,
            })?;

        tracing::info!(repo = name, %url, "cloning repo");
        let output = Command::new("git")
            .args(["clone", "--depth", "1", &url])
            .arg(&dir)
            .output()
            .await
            .map_err(|e| ProvisionError::Git { op: "clone", repo: name.to_string(), detail: e.to_string() })?;

        if !output.status.success() {
            return Err(ProvisionError::Git {
                op: "clone",
                repo: name.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(dir)
    }

    /// `git pull` an existing repo.
    pub async fn update(&self, name: &str) -> Result<(), ProvisionError> {
        let dir = self.paths.repo_dir(name);
        if !dir.is_dir() {
            return Err(ProvisionError::UnknownRepo(name.to_string()));
        }
        let output = Command::new("git")
            .arg("-C")
            .arg(&dir)
            .args(["pull", "--ff-only"])
            .output()
            .await
            .map_err(|e| ProvisionError::Git { op: "pull", repo: name.to_string(), detail: e.to_string() })?;
        if !output.status.success() {
            return Err(ProvisionError::Git {
                op: "pull",
                repo: name.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Toggle membership in the enabled list.
    pub fn enable(&self, name: &str) -> Result<bool, ProvisionError> {
        if !self.paths.repo_dir(name).is_dir() {
            return Err(ProvisionError::UnknownRepo(name.to_string()));
        }
        let mut enabled = EnabledRepos::load(&self.paths)?;
        let changed = enabled.enable(name);
        enabled.save(&self.paths)?;
        Ok(changed)
    }

    pub fn disable(&self, name: &str) -> Result<bool, ProvisionError> {
        let mut enabled = EnabledRepos::load(&self.paths)?;
        let changed = enabled.disable(name);
        enabled.save(&self.paths)?;
        Ok(changed)
    }

    /// Disable and delete the clone.
    pub fn remove(&self, name: &str) -> Result<(), ProvisionError> {
        self.disable(name)?;
        let dir = self.paths.repo_dir(name);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir)
                .map_err(|e| berth_workspace::WorkspaceError::Io { path: dir, source: e })?;
        }
        Ok(())
    }

    /// All cloned repos (enabled or not), sorted.
    pub fn list(&self) -> Result<Vec<String>, ProvisionError> {
        let repos_dir = self.paths.repos_dir();
        let mut names = Vec::new();
        let entries = match std::fs::read_dir(&repos_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => {
                return Err(berth_workspace::WorkspaceError::Io { path: repos_dir, source: e }.into())
            }
        };
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Agents in one repo: top-level subdirectories with a `manifest.json`.
    pub fn discover_agents(&self, repo: &str) -> Result<Vec<String>, ProvisionError> {
        let dir = self.paths.repo_dir(repo);
        if !dir.is_dir() {
            return Err(ProvisionError::UnknownRepo(repo.to_string()));
        }
        let mut agents = Vec::new();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| berth_workspace::WorkspaceError::Io { path: dir.clone(), source: e })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && path.join("manifest.json").is_file() {
                agents.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        agents.sort();
        Ok(agents)
    }

    /// Find an agent across enabled repos.
    ///
    /// `name` may be qualified (`repo/agent`). An unqualified name matching
    /// agents in several repos is ambiguous and must be qualified.
    pub fn find_agent(&self, name: &str) -> Result<(String, String), ProvisionError> {
        if let Some((repo, agent)) = name.split_once('/') {
            let enabled = EnabledRepos::load(&self.paths)?;
            if !enabled.contains(repo) {
                return Err(ProvisionError::UnknownRepo(repo.to_string()));
            }
            if !self.paths.manifest_file(repo, agent).is_file() {
                return Err(ProvisionError::AgentNotFound(name.to_string()));
            }
            return Ok((repo.to_string(), agent.to_string()));
        }

        let enabled = EnabledRepos::load(&self.paths)?;
        let mut candidates = Vec::new();
        for repo in enabled.iter() {
            if self.paths.manifest_file(repo, name).is_file() {
                candidates.push(repo.to_string());
            }
        }
        match candidates.as_slice() {
            [] => Err(ProvisionError::AgentNotFound(name.to_string())),
            [repo] => Ok((repo.clone(), name.to_string())),
            _ => Err(ProvisionError::AmbiguousAgent {
                name: name.to_string(),
                candidates: candidates.iter().map(|r| format!("{}/{}", r, name)).collect(),
            }),
        }
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
