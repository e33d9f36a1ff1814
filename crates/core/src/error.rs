// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure taxonomy shared across the orchestrator.
//!
//! Every failure anywhere in the system maps to exactly one [`FailureKind`].
//! Crate-local error enums carry the detail; the kind determines disposition
//! (retry, abort, restart, exit code).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract failure kinds. See each variant for its disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed manifest, invalid port, unknown profile. Surface and exit
    /// nonzero; never retried.
    Config,
    /// A required secret is absent in all sources. Aborts the lifecycle
    /// before any container hook runs.
    MissingSecret,
    /// No container runtime binary found. Surface and exit.
    EngineUnavailable,
    /// Temporary engine failure (network, image pull). Retried with backoff
    /// inside the lifecycle.
    EngineTransient,
    /// Container create/start/stop/remove failed. Recorded; repeated
    /// failures trip the per-container breaker.
    ContainerLifecycle,
    /// Liveness probe crossed its failure threshold. Triggers a container
    /// restart with CrashLoopBackOff.
    HealthProbeFailed,
    /// An agent MCP call failed upstream. Returned to the client as
    /// JSON-RPC -32603.
    RouterUpstream,
    /// Missing or invalid token. 401.
    AuthFailure,
    /// Unknown agent or route. 404 / JSON-RPC -32601.
    NotFound,
    /// Exec, probe, or upstream timeout. Exit code for the CLI, 504 or
    /// -32003 for the Router.
    Timeout,
    /// A bug. Logged with a stack and crashed with exit 100.
    InternalInvariant,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Config => "config_error",
            FailureKind::MissingSecret => "missing_secret",
            FailureKind::EngineUnavailable => "engine_unavailable",
            FailureKind::EngineTransient => "engine_transient",
            FailureKind::ContainerLifecycle => "container_lifecycle",
            FailureKind::HealthProbeFailed => "health_probe_failed",
            FailureKind::RouterUpstream => "router_upstream",
            FailureKind::AuthFailure => "auth_failure",
            FailureKind::NotFound => "not_found",
            FailureKind::Timeout => "timeout",
            FailureKind::InternalInvariant => "internal_invariant",
        };
        write!(f, "{}", s)
    }
}

/// Process exit codes with supervision meaning.
///
/// The Watchdog keys its restart decision on these: 0 and 2 are "do not
/// restart", anything >= 100 is fatal (manual intervention).
pub mod exit_code {
    /// Clean exit.
    pub const OK: i32 = 0;
    /// Generic failure; the Watchdog will restart the Router.
    pub const FAILURE: i32 = 1;
    /// Port conflict or permission problem; restarting cannot help.
    pub const PORT_OR_PERMISSION: i32 = 2;
    /// Fatal; circuit breaker tripped or invariant violated.
    pub const FATAL: i32 = 100;
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
