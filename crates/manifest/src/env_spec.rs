// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest env specifications.
//!
//! Three equivalent shapes are accepted and normalized early:
//!
//! - array of strings: `"NAME"` (required) or `"NAME=value"` (default)
//! - array of objects: `{name, varName?, required?, value?}`
//! - object map: `{NAME: {varName?, required?, default?}}` or `{NAME: "literal"}`
//!
//! String entries may also be wildcard patterns (`PREFIX_*`,
//! `PREFIX_*_SUFFIX`, or a bare `*`). The bare `*` never matches a host
//! variable whose name contains `API_KEY` or `APIKEY`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One normalized env record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    /// Name the variable takes inside the container.
    pub inside_name: String,
    /// Host-side source name (defaults to `inside_name`).
    pub source_name: String,
    pub required: bool,
    pub default: Option<String>,
}

impl EnvEntry {
    /// Required variable with the same name on both sides.
    pub fn required(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { inside_name: name.clone(), source_name: name, required: true, default: None }
    }

    /// Optional variable with a default.
    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            inside_name: name.clone(),
            source_name: name,
            required: false,
            default: Some(default.into()),
        }
    }
}

/// A wildcard env-forwarding pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildcardPattern {
    pub prefix: String,
    pub suffix: String,
}

impl WildcardPattern {
    /// Parse a pattern containing exactly one `*`.
    fn parse(s: &str) -> Option<Self> {
        let star = s.find('*')?;
        if s[star + 1..].contains('*') {
            return None;
        }
        Some(Self { prefix: s[..star].to_string(), suffix: s[star + 1..].to_string() })
    }

    fn is_bare_star(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Whether `name` matches, honoring the bare-`*` secret carve-out.
    pub fn matches(&self, name: &str) -> bool {
        if self.is_bare_star() {
            let upper = name.to_ascii_uppercase();
            if upper.contains("API_KEY") || upper.contains("APIKEY") {
                return false;
            }
            return true;
        }
        name.len() >= self.prefix.len() + self.suffix.len()
            && name.starts_with(&self.prefix)
            && name.ends_with(&self.suffix)
    }
}

/// Normalized env spec: explicit entries plus wildcard patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedEnv {
    pub entries: Vec<EnvEntry>,
    pub wildcards: Vec<WildcardPattern>,
}

impl NormalizedEnv {
    /// Merge `overlay` into `self`: overlay entries win on `inside_name`
    /// conflicts, everything else extends.
    pub fn merged_with(&self, overlay: &NormalizedEnv) -> NormalizedEnv {
        let mut entries = self.entries.clone();
        for entry in &overlay.entries {
            if let Some(existing) =
                entries.iter_mut().find(|e| e.inside_name == entry.inside_name)
            {
                *existing = entry.clone();
            } else {
                entries.push(entry.clone());
            }
        }
        let mut wildcards = self.wildcards.clone();
        for pattern in &overlay.wildcards {
            if !wildcards.contains(pattern) {
                wildcards.push(pattern.clone());
            }
        }
        NormalizedEnv { entries, wildcards }
    }

    /// Expand wildcard patterns against a host environment snapshot.
    ///
    /// Matches are forwarded under their own names, in the order given.
    pub fn expand_wildcards<'a>(
        &self,
        host_env: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (name, value) in host_env {
            if self.wildcards.iter().any(|p| p.matches(name)) {
                out.push((name.clone(), value.clone()));
            }
        }
        out
    }
}

/// A required env var was absent in every source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required environment variable '{name}' is not set")]
pub struct MissingRequiredEnv {
    pub name: String,
}

/// Build `(inside_name, value)` pairs for explicit entries.
///
/// Values come from `lookup` (host env / secrets), falling back to the
/// entry default. Required-and-absent fails; optional-and-absent entries
/// are skipped.
pub fn build_env_values(
    entries: &[EnvEntry],
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<(String, String)>, MissingRequiredEnv> {
    let mut out = Vec::new();
    for entry in entries {
        let value = lookup(&entry.source_name).or_else(|| entry.default.clone());
        match value {
            Some(value) => out.push((entry.inside_name.clone(), value)),
            None if entry.required => {
                return Err(MissingRequiredEnv { name: entry.source_name.clone() })
            }
            None => {}
        }
    }
    Ok(out)
}

/// The three accepted on-disk shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvSpec {
    /// `["NAME", "NAME=value", "PREFIX_*"]`
    Strings(Vec<StringOrObjectEntry>),
    /// `{NAME: {...}}` or `{NAME: "literal"}`
    Map(IndexMap<String, MapEntry>),
}

impl Default for EnvSpec {
    fn default() -> Self {
        EnvSpec::Strings(Vec::new())
    }
}

/// Array element: a string form or an object form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrObjectEntry {
    Text(String),
    Object {
        name: String,
        #[serde(default, rename = "varName", skip_serializing_if = "Option::is_none")]
        var_name: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

/// Map value: full object or a literal default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MapEntry {
    Literal(String),
    Full {
        #[serde(default, rename = "varName", skip_serializing_if = "Option::is_none")]
        var_name: Option<String>,
        #[serde(default)]
        required: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
}

impl EnvSpec {
    /// Normalize any accepted shape into entries + wildcards.
    pub fn normalize(&self) -> NormalizedEnv {
        let mut normalized = NormalizedEnv::default();
        match self {
            EnvSpec::Strings(items) => {
                for item in items {
                    match item {
                        StringOrObjectEntry::Text(text) => {
                            if text.contains('*') {
                                if let Some(pattern) = WildcardPattern::parse(text) {
                                    normalized.wildcards.push(pattern);
                                } else {
                                    tracing::warn!(pattern = %text, "ignoring malformed wildcard");
                                }
                            } else if let Some((name, value)) = text.split_once('=') {
                                normalized
                                    .entries
                                    .push(EnvEntry::with_default(name.trim(), value));
                            } else {
                                normalized.entries.push(EnvEntry::required(text.trim()));
                            }
                        }
                        StringOrObjectEntry::Object { name, var_name, required, value } => {
                            normalized.entries.push(EnvEntry {
                                inside_name: name.clone(),
                                source_name: var_name.clone().unwrap_or_else(|| name.clone()),
                                required: *required,
                                default: value.clone(),
                            });
                        }
                    }
                }
            }
            EnvSpec::Map(map) => {
                for (name, entry) in map {
                    match entry {
                        MapEntry::Literal(value) => {
                            normalized.entries.push(EnvEntry::with_default(name, value));
                        }
                        MapEntry::Full { var_name, required, default } => {
                            normalized.entries.push(EnvEntry {
                                inside_name: name.clone(),
                                source_name: var_name.clone().unwrap_or_else(|| name.clone()),
                                required: *required,
                                default: default.clone(),
                            });
                        }
                    }
                }
            }
        }
        normalized
    }
}

#[cfg(test)]
#[path = "env_spec_tests.rs"]
mod tests;
