// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets: the line-oriented `.meta/secrets` file and multi-source lookup.
//!
//! A value beginning with `$` references another variable name; resolution
//! recurses with cycle detection and returns the empty string on a cycle or
//! dangling reference. Lookup priority across sources: process environment,
//! then the secrets file, then an optional `.env` in the workspace root.

use crate::error::WorkspaceError;
use crate::paths::WorkspacePaths;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

/// Human-readable source list for missing-secret errors.
pub const SECRET_SOURCE_LIST: &str = "environment, secrets file, .env file";

/// Parsed `KEY=VALUE` file. Preserves insertion order for rewriting.
#[derive(Debug, Clone, Default)]
pub struct SecretsFile {
    entries: Vec<(String, String)>,
}

impl SecretsFile {
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                if key.is_empty() {
                    continue;
                }
                // Last assignment wins; keys stay unique.
                let value = value.trim().to_string();
                if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                    existing.1 = value;
                } else {
                    entries.push((key, value));
                }
            }
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, WorkspaceError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(WorkspaceError::io(path, e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkspaceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
        }
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        std::fs::write(path, out).map_err(|e| WorkspaceError::io(path, e))
    }

    /// Raw value (no alias resolution).
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Resolve a key with `$alias` chasing.
    ///
    /// Cycles and dangling references resolve to the empty string; the
    /// function always terminates because each hop consumes an unvisited
    /// key.
    pub fn resolve(&self, key: &str) -> String {
        let mut visited = HashSet::new();
        let mut current = key.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return String::new();
            }
            match self.raw(&current) {
                None => return String::new(),
                Some(value) => match value.strip_prefix('$') {
                    Some(next) => current = next.to_string(),
                    None => return value.to_string(),
                },
            }
        }
    }
}

/// Multi-source secret lookup bound to one workspace.
#[derive(Debug, Clone)]
pub struct SecretSources {
    secrets: SecretsFile,
    dotenv: HashMap<String, String>,
}

impl SecretSources {
    pub fn load(paths: &WorkspacePaths) -> Result<Self, WorkspaceError> {
        let secrets = SecretsFile::load(&paths.secrets_file())?;
        let dotenv_path = paths.root().join(".env");
        let dotenv = match std::fs::read_to_string(&dotenv_path) {
            Ok(content) => SecretsFile::parse(&content)
                .entries
                .into_iter()
                .collect::<HashMap<_, _>>(),
            Err(_) => HashMap::new(),
        };
        Ok(Self { secrets, dotenv })
    }

    /// Assemble sources directly (test builders).
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_parts(secrets: SecretsFile, dotenv: HashMap<String, String>) -> Self {
        Self { secrets, dotenv }
    }

    /// Look a name up across sources in priority order. Empty resolutions
    /// (cycles, dangling aliases) count as absent.
    pub fn get(&self, name: &str) -> Option<String> {
        if let Ok(value) = std::env::var(name) {
            return Some(value);
        }
        let resolved = self.secrets.resolve(name);
        if !resolved.is_empty() {
            return Some(resolved);
        }
        self.dotenv.get(name).cloned().filter(|v| !v.is_empty())
    }

    pub fn secrets_file(&self) -> &SecretsFile {
        &self.secrets
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
