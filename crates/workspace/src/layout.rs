// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory skeleton and symlink discipline.
//!
//! Symlinks (`code/<name>`, `skills/<name>`) point into `.meta/repos/...`.
//! The rules: never overwrite a real file or directory; remove a previous
//! symlink before re-linking; warn and skip on conflict. Engine mounts do
//! not reliably follow host symlinks, so mount composition always resolves
//! through [`resolve_real`] first.

use crate::error::WorkspaceError;
use crate::paths::WorkspacePaths;
use std::path::{Path, PathBuf};

/// Create every directory the orchestrator expects. Idempotent.
pub fn ensure_skeleton(paths: &WorkspacePaths) -> Result<(), WorkspaceError> {
    let dirs = [
        paths.meta_dir(),
        paths.repos_dir(),
        paths.running_dir(),
        paths.blobs_dir(),
        paths.agents_dir(),
        paths.code_dir(),
        paths.skills_dir(),
        paths.logs_dir(),
    ];
    for dir in dirs {
        std::fs::create_dir_all(&dir).map_err(|e| WorkspaceError::io(&dir, e))?;
    }
    Ok(())
}

/// Create (or refresh) a symlink at `link` pointing to `target`.
///
/// Returns `Ok(false)` (warn-and-skip) when a real file or directory is in
/// the way; only previous symlinks are replaced.
pub fn create_symlink(target: &Path, link: &Path) -> Result<bool, WorkspaceError> {
    if let Ok(meta) = std::fs::symlink_metadata(link) {
        if meta.file_type().is_symlink() {
            std::fs::remove_file(link).map_err(|e| WorkspaceError::io(link, e))?;
        } else {
            tracing::warn!(link = %link.display(), "refusing to replace non-symlink; skipping");
            return Ok(false);
        }
    }
    if let Some(parent) = link.parent() {
        std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    symlink(target, link).map_err(|e| WorkspaceError::io(link, e))?;
    Ok(true)
}

/// Remove a symlink if present. Real files are left alone.
pub fn remove_symlink(link: &Path) -> Result<(), WorkspaceError> {
    match std::fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            std::fs::remove_file(link).map_err(|e| WorkspaceError::io(link, e))
        }
        Ok(_) => Err(WorkspaceError::SymlinkConflict(link.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WorkspaceError::io(link, e)),
    }
}

/// Resolve a path through symlinks to its real location.
///
/// Falls back to the input when the path does not exist yet (a mount for a
/// directory that is about to be created).
pub fn resolve_real(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
