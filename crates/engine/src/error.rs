// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed engine failures, mapped from CLI stderr.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the engine adapter.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no container runtime found (tried podman, docker); set CONTAINER_RUNTIME to override")]
    EngineUnavailable,

    #[error("failed to pull image '{image}': {detail}")]
    ImagePullFailed { image: String, detail: String },

    #[error("container name '{name}' already in use")]
    NameConflict { name: String },

    #[error("host port conflict: {detail}")]
    PortConflict { detail: String },

    #[error("invalid mount: {detail}")]
    MountInvalid { detail: String },

    #[error("container '{0}' not found")]
    NotFound(String),

    #[error("engine command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("engine command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("failed to spawn engine binary: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("unparseable engine output: {0}")]
    BadOutput(String),
}

impl EngineError {
    /// Classify a nonzero-exit CLI failure from its stderr text.
    ///
    /// The docker and podman CLIs phrase these differently; matching is on
    /// the common substrings both emit.
    pub(crate) fn classify(command: &str, image: Option<&str>, name: &str, stderr: &str) -> Self {
        let lower = stderr.to_ascii_lowercase();
        if lower.contains("already in use") && lower.contains("name") {
            return EngineError::NameConflict { name: name.to_string() };
        }
        if lower.contains("port is already allocated") || lower.contains("address already in use") {
            return EngineError::PortConflict { detail: stderr.trim().to_string() };
        }
        if lower.contains("pull access denied")
            || lower.contains("manifest unknown")
            || lower.contains("unable to find image")
            || lower.contains("no such image")
        {
            return EngineError::ImagePullFailed {
                image: image.unwrap_or("<unknown>").to_string(),
                detail: stderr.trim().to_string(),
            };
        }
        if lower.contains("invalid mount") || lower.contains("bind source path does not exist") {
            return EngineError::MountInvalid { detail: stderr.trim().to_string() };
        }
        if lower.contains("no such container") {
            return EngineError::NotFound(name.to_string());
        }
        EngineError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.trim().to_string(),
        }
    }

    /// Whether a retry with backoff is reasonable (transient engine state).
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::ImagePullFailed { .. } | EngineError::Timeout { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
