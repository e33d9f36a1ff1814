// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use berth_core::ports::PortParseError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single validation finding. Validation collects all of these instead of
/// stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("manifest must declare exactly one of 'container' or 'image'")]
    MissingImage,

    #[error("manifest declares both 'container' and 'image'")]
    BothContainerAndImage,

    #[error("image URI is empty")]
    EmptyImage,

    #[error("invalid port spec: {0}")]
    BadPort(#[from] PortParseError),

    #[error("profile '{profile}': invalid port spec: {source}")]
    BadProfilePort {
        profile: String,
        #[source]
        source: PortParseError,
    },

    #[error("unknown profile '{0}' (expected dev, qa, or prod)")]
    UnknownProfile(String),

    #[error("probe script '{0}' must be a bare filename (no '/' or '..')")]
    BadProbeScript(String),

    #[error("host hook '{hook}' script '{script}' not found under the agent directory")]
    HookScriptMissing { hook: String, script: String },

    #[error("host hook '{hook}' script '{script}' escapes the agent directory")]
    HookScriptTraversal { hook: String, script: String },

    #[error("invalid enable directive '{directive}': {detail}")]
    BadEnableDirective { directive: String, detail: String },

    #[error("volume target '{0}' must be an absolute container path")]
    RelativeVolumeTarget(String),
}

/// Manifest-level failures.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(ValidationReport),
}

/// All findings from one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport(pub Vec<ValidationError>);

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "manifest validation failed ({} problems):", self.0.len())?;
        for error in &self.0 {
            writeln!(f, "  - {}", error)?;
        }
        Ok(())
    }
}
