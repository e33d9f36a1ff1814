// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime detection: podman preferred (rootless default), docker fallback,
//! `CONTAINER_RUNTIME` override.

use crate::error::EngineError;
use std::path::Path;

/// The underlying container engine CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Resolve the runtime to use.
    ///
    /// `CONTAINER_RUNTIME=docker|podman` wins; otherwise podman is preferred
    /// when its binary resolves on PATH, else docker.
    pub fn detect() -> Result<Self, EngineError> {
        if let Ok(forced) = std::env::var("CONTAINER_RUNTIME") {
            return match forced.trim() {
                "docker" => Ok(ContainerRuntime::Docker),
                "podman" => Ok(ContainerRuntime::Podman),
                _ => Err(EngineError::EngineUnavailable),
            };
        }
        if binary_on_path("podman") {
            return Ok(ContainerRuntime::Podman);
        }
        if binary_on_path("docker") {
            return Ok(ContainerRuntime::Docker);
        }
        Err(EngineError::EngineUnavailable)
    }
}

fn binary_on_path(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
