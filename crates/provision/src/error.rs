// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use berth_core::error::FailureKind;
use berth_workspace::SECRET_SOURCE_LIST;
use thiserror::Error;

/// Provisioning failures across repos, lifecycle, and the service manager.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Workspace(#[from] berth_workspace::WorkspaceError),

    #[error(transparent)]
    Manifest(#[from] berth_manifest::ManifestError),

    #[error(transparent)]
    Engine(#[from] berth_engine::EngineError),

    #[error("missing required secrets: {}. Checked sources: {}. \
             Run `berth secrets set <NAME> <value>` or export the variable.",
            .missing.join(", "), SECRET_SOURCE_LIST)]
    MissingSecrets { missing: Vec<String> },

    #[error("required environment variable '{0}' is not set")]
    MissingRequiredEnv(String),

    #[error("step '{step}' failed: {detail}")]
    StepFailed { step: &'static str, detail: String },

    #[error("hook '{hook}' timed out after {seconds}s")]
    HookTimeout { hook: String, seconds: u64 },

    #[error("hook script '{0}' escapes the agent directory")]
    HookTraversal(String),

    #[error("git {op} failed for '{repo}': {detail}")]
    Git { op: &'static str, repo: String, detail: String },

    #[error("unknown repo '{0}'. Run `berth repo add {0} <url>` first")]
    UnknownRepo(String),

    #[error("agent '{0}' not found in any enabled repo. Run `berth repo enable <repo>` first")]
    AgentNotFound(String),

    #[error("agent '{name}' is ambiguous; qualify it: {}", candidates.join(", "))]
    AmbiguousAgent { name: String, candidates: Vec<String> },

    #[error("{0}")]
    Config(String),

    #[error("no free host port found in [{0}, {1}]")]
    NoFreePort(u16, u16),
}

impl ProvisionError {
    /// Map onto the shared failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProvisionError::Workspace(_) => FailureKind::Config,
            ProvisionError::Manifest(_) => FailureKind::Config,
            ProvisionError::Engine(e) if e.is_transient() => FailureKind::EngineTransient,
            ProvisionError::Engine(berth_engine::EngineError::EngineUnavailable) => {
                FailureKind::EngineUnavailable
            }
            ProvisionError::Engine(_) => FailureKind::ContainerLifecycle,
            ProvisionError::MissingSecrets { .. } => FailureKind::MissingSecret,
            ProvisionError::MissingRequiredEnv(_) => FailureKind::MissingSecret,
            ProvisionError::StepFailed { .. } => FailureKind::ContainerLifecycle,
            ProvisionError::HookTimeout { .. } => FailureKind::Timeout,
            ProvisionError::HookTraversal(_) => FailureKind::Config,
            ProvisionError::Git { .. } => FailureKind::EngineTransient,
            ProvisionError::UnknownRepo(_) => FailureKind::NotFound,
            ProvisionError::AgentNotFound(_) => FailureKind::NotFound,
            ProvisionError::AmbiguousAgent { .. } => FailureKind::Config,
            ProvisionError::Config(_) => FailureKind::Config,
            ProvisionError::NoFreePort(..) => FailureKind::ContainerLifecycle,
        }
    }
}
