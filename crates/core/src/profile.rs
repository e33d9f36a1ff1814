// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profiles and per-profile mount modes.
//!
//! A profile is a named overlay (`dev`|`qa`|`prod`) altering mounts, env,
//! secrets, and hooks. The active profile defaults to `dev` and is persisted
//! in `.meta/profile`; an agent record may override it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named configuration overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Dev,
    Qa,
    Prod,
}

impl Profile {
    /// Conventional environment name injected as `ORCH_PROFILE_ENV`.
    pub fn env_name(&self) -> &'static str {
        match self {
            Profile::Dev => "development",
            Profile::Qa => "qa",
            Profile::Prod => "production",
        }
    }

    /// Default mount mode for code and skills under this profile.
    ///
    /// Dev mounts read-write; qa and prod mount read-only. A manifest may
    /// override per mount via `mounts.{code,skills}`.
    pub fn default_mount_mode(&self) -> MountMode {
        match self {
            Profile::Dev => MountMode::Rw,
            Profile::Qa | Profile::Prod => MountMode::Ro,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Dev => write!(f, "dev"),
            Profile::Qa => write!(f, "qa"),
            Profile::Prod => write!(f, "prod"),
        }
    }
}

/// Error for an unrecognized profile name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown profile '{0}' (expected dev, qa, or prod)")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dev" => Ok(Profile::Dev),
            "qa" => Ok(Profile::Qa),
            "prod" => Ok(Profile::Prod),
            other => Err(UnknownProfile(other.to_string())),
        }
    }
}

/// Bind-mount access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    Ro,
    Rw,
}

impl MountMode {
    /// The suffix used in engine `-v host:container:<mode>` arguments.
    pub fn as_flag(&self) -> &'static str {
        match self {
            MountMode::Ro => "ro",
            MountMode::Rw => "rw",
        }
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_flag())
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
