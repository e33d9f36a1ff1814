// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON persistence: write to a tempfile in the target directory,
//! then rename over the destination. Readers never observe a torn file.

use crate::error::WorkspaceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Read a JSON file into `T`; `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, WorkspaceError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WorkspaceError::io(path, e)),
    };
    let value = serde_json::from_str(&raw)
        .map_err(|e| WorkspaceError::BadJson { path: path.to_path_buf(), source: e })?;
    Ok(Some(value))
}

/// Atomically write `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WorkspaceError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;

    let json = serde_json::to_string_pretty(value).map_err(|e| WorkspaceError::BadJson {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| WorkspaceError::io(parent, e))?;
    tmp.write_all(json.as_bytes()).map_err(|e| WorkspaceError::io(path, e))?;
    tmp.write_all(b"\n").map_err(|e| WorkspaceError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| WorkspaceError::io(path, e))?;
    tmp.persist(path).map_err(|e| WorkspaceError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
