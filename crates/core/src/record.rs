// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent records — one per enabled agent, persisted in `.meta/agents.json`.
//!
//! A record ties a user-chosen name (alias or agent name) to its source
//! identity (repo + agent), the container it materializes as, and the
//! normalized runtime config used to reconcile that container.

use crate::ports::PortSpec;
use crate::profile::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the agent's project path is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Per-workspace working directory (the default).
    #[default]
    Isolated,
    /// Shared working directory across workspaces.
    Global,
    /// Development mode: working directory is the checked-out repo itself.
    Devel,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Isolated => write!(f, "isolated"),
            RunMode::Global => write!(f, "global"),
            RunMode::Devel => write!(f, "devel"),
        }
    }
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isolated" => Ok(RunMode::Isolated),
            "global" => Ok(RunMode::Global),
            "devel" => Ok(RunMode::Devel),
            _ => Err(()),
        }
    }
}

/// What kind of service the manifest declares.
///
/// Only `agent` containers are supervised by the container monitor and
/// receive routes in the routing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    #[default]
    Agent,
    Service,
    Tool,
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentType::Agent => write!(f, "agent"),
            AgentType::Service => write!(f, "service"),
            AgentType::Tool => write!(f, "tool"),
        }
    }
}

/// Normalized container runtime config captured at enable time.
///
/// Used by the service manager to detect structural drift between the
/// desired and actual container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRuntimeConfig {
    /// Bind mounts as `host:container[:mode]` strings (hosts realpath'd).
    #[serde(default)]
    pub binds: Vec<String>,
    /// Environment as `NAME=value` pairs.
    #[serde(default)]
    pub env: Vec<String>,
    /// Parsed port mappings.
    #[serde(default)]
    pub ports: Vec<PortSpec>,
}

/// One enabled agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Unique record name (user-chosen alias or the agent name).
    pub name: String,
    /// Source repository name.
    pub repo_name: String,
    /// Agent directory name within the repository.
    pub agent_name: String,
    /// Image URI the container is created from.
    pub container_image: String,
    /// Deterministic container name (`orch_<repo>_<agent>_<hash8>`).
    pub container_name: String,
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default, rename = "type")]
    pub agent_type: AgentType,
    /// Per-record profile override; `None` follows the workspace profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub config: AgentRuntimeConfig,
}

impl AgentRecord {
    /// Effective profile for this record given the workspace-wide profile.
    pub fn effective_profile(&self, workspace_profile: Profile) -> Profile {
        self.profile.unwrap_or(workspace_profile)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
