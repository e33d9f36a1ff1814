// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The manifest itself (`manifest.json`), read-only to the orchestrator.

use crate::env_spec::EnvSpec;
use crate::error::ManifestError;
use crate::probe::HealthSpec;
use berth_core::profile::MountMode;
use berth_core::record::AgentType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A lifecycle hook: a single command or a list, normalized to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s.clone()],
            StringOrList::Many(list) => list.clone(),
        }
    }
}

/// Per-mount mode overrides (`mounts.code`, `mounts.skills`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<MountMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<MountMode>,
}

/// A profile overlay: the subset of manifest keys a profile may override.
///
/// Unknown keys are rejected so a typoed overlay fails validation instead
/// of silently doing nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expose: Option<EnvSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounts: Option<MountsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preinstall: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postinstall: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosthook_aftercreation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosthook_postinstall: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, String>,
}

/// The declarative per-agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Image URI (short form). Exactly one of `container`/`image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, rename = "type")]
    pub agent_type: AgentType,

    // Lifecycle hooks, string or string-array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preinstall: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postinstall: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli: Option<StringOrList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<StringOrList>,

    // Host hooks (scripts under the agent's repo directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosthook_aftercreation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosthook_postinstall: Option<String>,

    #[serde(default)]
    pub env: EnvSpec,
    /// Additional env forwarded into the container.
    #[serde(default)]
    pub expose: EnvSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Host-relative source → container-absolute target.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounts: Option<MountsOverride>,

    /// Directives for dependent agents (`NAME [MODE] [REPO] ['as' ALIAS]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable: Vec<String>,
    /// Additional repositories to clone before resolving `enable`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthSpec>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, ProfileOverlay>,
    #[serde(default, rename = "defaultProfile", skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

impl Manifest {
    /// Read and parse a manifest file. Validation is separate (see
    /// [`crate::validate`]) so callers can report every problem at once.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::Read { path: path.to_path_buf(), source: e })?;
        serde_json::from_str(&raw)
            .map_err(|e| ManifestError::Parse { path: path.to_path_buf(), source: e })
    }

    /// The declared image URI, whichever key carries it.
    pub fn image_uri(&self) -> Option<&str> {
        self.container.as_deref().or(self.image.as_deref())
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
