// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Workspace-state failures.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no workspace found: walked up from {0} without finding a .meta directory")]
    NotFound(PathBuf),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    BadJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("refusing to replace non-symlink {0} (real file or directory in the way)")]
    SymlinkConflict(PathBuf),

    #[error("routing table is locked by another writer")]
    RoutingLocked,
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io { path: path.into(), source }
    }
}
