// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema-level validation, reporting all problems at once.

use crate::error::{ValidationError, ValidationReport};
use crate::manifest::Manifest;
use berth_core::enable::EnableDirective;
use berth_core::ports::PortSpec;
use berth_core::profile::Profile;
use std::path::Path;

/// Validate a manifest, optionally checking host-hook scripts against the
/// agent's repository directory (skipped when `agent_dir` is `None`).
pub fn validate(manifest: &Manifest, agent_dir: Option<&Path>) -> Result<(), ValidationReport> {
    let mut errors = Vec::new();

    match (&manifest.container, &manifest.image) {
        (Some(_), Some(_)) => errors.push(ValidationError::BothContainerAndImage),
        (None, None) => errors.push(ValidationError::MissingImage),
        _ => {
            if manifest.image_uri().map(str::trim).unwrap_or_default().is_empty() {
                errors.push(ValidationError::EmptyImage);
            }
        }
    }

    for raw in &manifest.ports {
        if let Err(e) = raw.parse::<PortSpec>() {
            errors.push(ValidationError::BadPort(e));
        }
    }

    for (name, overlay) in &manifest.profiles {
        if name.parse::<Profile>().is_err() {
            errors.push(ValidationError::UnknownProfile(name.clone()));
        }
        for raw in &overlay.ports {
            if let Err(e) = raw.parse::<PortSpec>() {
                errors.push(ValidationError::BadProfilePort { profile: name.clone(), source: e });
            }
        }
    }

    if let Some(name) = &manifest.default_profile {
        if name.parse::<Profile>().is_err() {
            errors.push(ValidationError::UnknownProfile(name.clone()));
        }
    }

    if let Some(health) = &manifest.health {
        for probe in [&health.liveness, &health.readiness].into_iter().flatten() {
            if !probe.script_is_valid() {
                errors.push(ValidationError::BadProbeScript(probe.script.clone()));
            }
        }
    }

    for directive in &manifest.enable {
        if let Err(e) = directive.parse::<EnableDirective>() {
            errors.push(ValidationError::BadEnableDirective {
                directive: directive.clone(),
                detail: e.to_string(),
            });
        }
    }

    for target in manifest.volumes.values() {
        if !target.starts_with('/') {
            errors.push(ValidationError::RelativeVolumeTarget(target.clone()));
        }
    }

    let hooks = [
        ("hosthook_aftercreation", &manifest.hosthook_aftercreation),
        ("hosthook_postinstall", &manifest.hosthook_postinstall),
    ];
    for (hook, script) in hooks {
        let Some(script) = script else { continue };
        if script.starts_with('/') || script.split('/').any(|part| part == "..") {
            errors.push(ValidationError::HookScriptTraversal {
                hook: hook.to_string(),
                script: script.clone(),
            });
            continue;
        }
        if let Some(dir) = agent_dir {
            if !dir.join(script).is_file() {
                errors.push(ValidationError::HookScriptMissing {
                    hook: hook.to_string(),
                    script: script.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport(errors))
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
