// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted registries: agent records and the enabled-repo set.

use crate::error::WorkspaceError;
use crate::paths::WorkspacePaths;
use crate::store;
use berth_core::record::AgentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The agent registry (`.meta/agents.json`), keyed by record name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentRecord>,
}

impl AgentRegistry {
    pub fn load(paths: &WorkspacePaths) -> Result<Self, WorkspaceError> {
        Ok(store::read_json(&paths.agents_file())?.unwrap_or_default())
    }

    pub fn save(&self, paths: &WorkspacePaths) -> Result<(), WorkspaceError> {
        store::write_json(&paths.agents_file(), self)
    }

    pub fn get(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Insert or replace a record under its name.
    pub fn upsert(&mut self, record: AgentRecord) {
        self.agents.insert(record.name.clone(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<AgentRecord> {
        self.agents.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentRecord> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Ordered set of enabled repository names (`.meta/enabled_repos.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnabledRepos {
    repos: Vec<String>,
}

impl EnabledRepos {
    pub fn load(paths: &WorkspacePaths) -> Result<Self, WorkspaceError> {
        Ok(store::read_json(&paths.enabled_repos_file())?.unwrap_or_default())
    }

    pub fn save(&self, paths: &WorkspacePaths) -> Result<(), WorkspaceError> {
        store::write_json(&paths.enabled_repos_file(), self)
    }

    pub fn contains(&self, repo: &str) -> bool {
        self.repos.iter().any(|r| r == repo)
    }

    /// Append if absent; preserves enable order, no duplicates.
    pub fn enable(&mut self, repo: &str) -> bool {
        if self.contains(repo) {
            return false;
        }
        self.repos.push(repo.to_string());
        true
    }

    pub fn disable(&mut self, repo: &str) -> bool {
        let before = self.repos.len();
        self.repos.retain(|r| r != repo);
        self.repos.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.repos.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
