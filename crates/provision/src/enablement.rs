// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recursive enable-directive expansion.
//!
//! Manifests can reference further agents (`enable[]`) which can reference
//! more in turn. Expansion is a breadth-first fixed point over a visited
//! set: a reference back to an already-expanded agent is skipped, so
//! cyclic manifests terminate. Unresolvable references surface as config
//! errors.

use crate::error::ProvisionError;
use berth_core::enable::EnableDirective;
use berth_manifest::Manifest;
use std::collections::{HashSet, VecDeque};

/// Expand a root set of directives into the full transitive set, roots
/// first.
///
/// `find` resolves an unqualified agent name to `(repo, agent)`;
/// `manifest_for(repo, agent)` loads a dependency's manifest.
pub fn expand_enable_directives(
    roots: &[EnableDirective],
    find: impl Fn(&str) -> Result<(String, String), ProvisionError>,
    manifest_for: impl Fn(&str, &str) -> Result<Manifest, ProvisionError>,
) -> Result<Vec<(EnableDirective, String, String)>, ProvisionError> {
    let mut queue: VecDeque<EnableDirective> = roots.iter().cloned().collect();
    let mut visited: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();

    while let Some(directive) = queue.pop_front() {
        let (repo, agent) = match &directive.repo {
            Some(repo) => (repo.clone(), directive.name.clone()),
            None => find(&directive.name)?,
        };

        if !visited.insert((repo.clone(), agent.clone())) {
            continue;
        }

        let manifest = manifest_for(&repo, &agent)?;
        for raw in &manifest.enable {
            let nested: EnableDirective = raw.parse().map_err(|e| {
                ProvisionError::Config(format!(
                    "agent '{}/{}': bad enable directive '{}': {}",
                    repo, agent, raw, e
                ))
            })?;
            queue.push_back(nested);
        }

        out.push((directive, repo, agent));
    }

    Ok(out)
}

#[cfg(test)]
#[path = "enablement_tests.rs"]
mod tests;
