// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effective-config resolution.
//!
//! `effective = defaults ∘ manifest-top-level ∘ profiles[active]` where ∘ is
//! shallow override per key, except `env`/`expose`, which are merged with
//! the profile winning on key conflicts. Secrets extend (union).

use crate::env_spec::NormalizedEnv;
use crate::error::{ManifestError, ValidationError, ValidationReport};
use crate::manifest::{Manifest, ProfileOverlay, StringOrList};
use crate::probe::HealthSpec;
use berth_core::ports::PortSpec;
use berth_core::profile::{MountMode, Profile};
use berth_core::record::AgentType;

/// Resolved mount modes for the code and skills mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountModes {
    pub code: MountMode,
    pub skills: MountMode,
}

/// The flattened configuration the service manager consumes.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub profile: Profile,
    pub image: String,
    pub agent_type: AgentType,

    pub preinstall: Vec<String>,
    pub install: Vec<String>,
    pub postinstall: Vec<String>,
    pub update: Vec<String>,
    pub start: Vec<String>,
    pub agent: Vec<String>,
    pub cli: Vec<String>,
    pub run: Vec<String>,

    pub hosthook_aftercreation: Option<String>,
    pub hosthook_postinstall: Option<String>,

    pub env: NormalizedEnv,
    pub expose: NormalizedEnv,
    pub secrets: Vec<String>,

    pub ports: Vec<PortSpec>,
    /// Host-relative source → container-absolute target.
    pub volumes: Vec<(String, String)>,
    pub mounts: MountModes,
    pub health: Option<HealthSpec>,
}

impl EffectiveConfig {
    /// The command keeping the container long-lived: `agent`, else `start`,
    /// else `run`.
    pub fn entry_command(&self) -> Option<String> {
        [&self.agent, &self.start, &self.run]
            .into_iter()
            .find(|cmds| !cmds.is_empty())
            .map(|cmds| cmds.join(" && "))
    }

    /// Whether the agent uses a `start` entry point (installer skip rule).
    pub fn uses_start_entry(&self) -> bool {
        !self.start.is_empty() && self.agent.is_empty()
    }
}

fn hook(base: &Option<StringOrList>, overlay: &Option<StringOrList>) -> Vec<String> {
    overlay.as_ref().or(base.as_ref()).map(StringOrList::to_vec).unwrap_or_default()
}

/// Resolve the effective configuration for `profile`.
pub fn resolve(manifest: &Manifest, profile: Profile) -> Result<EffectiveConfig, ManifestError> {
    let mut errors = Vec::new();

    let image = match manifest.image_uri() {
        Some(uri) if !uri.trim().is_empty() => uri.to_string(),
        Some(_) => {
            errors.push(ValidationError::EmptyImage);
            String::new()
        }
        None => {
            errors.push(ValidationError::MissingImage);
            String::new()
        }
    };

    let empty = ProfileOverlay::default();
    let overlay = manifest.profiles.get(&profile.to_string()).unwrap_or(&empty);

    // Ports: overlay replaces when it declares any.
    let port_strings: &[String] =
        if overlay.ports.is_empty() { &manifest.ports } else { &overlay.ports };
    let mut ports = Vec::new();
    for raw in port_strings {
        match raw.parse::<PortSpec>() {
            Ok(spec) => ports.push(spec),
            Err(e) => errors.push(ValidationError::BadPort(e)),
        }
    }

    // Volumes: overlay replaces when it declares any.
    let volume_map = if overlay.volumes.is_empty() { &manifest.volumes } else { &overlay.volumes };
    let volumes: Vec<(String, String)> =
        volume_map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

    // Env and expose merge; the profile wins on conflicts.
    let env = match &overlay.env {
        Some(profile_env) => manifest.env.normalize().merged_with(&profile_env.normalize()),
        None => manifest.env.normalize(),
    };
    let expose = match &overlay.expose {
        Some(profile_expose) => {
            manifest.expose.normalize().merged_with(&profile_expose.normalize())
        }
        None => manifest.expose.normalize(),
    };

    // Secrets extend (union, order preserved).
    let mut secrets = manifest.secrets.clone();
    for name in &overlay.secrets {
        if !secrets.contains(name) {
            secrets.push(name.clone());
        }
    }

    let default_mode = profile.default_mount_mode();
    let mounts_override = overlay.mounts.as_ref().or(manifest.mounts.as_ref());
    let mounts = MountModes {
        code: mounts_override.and_then(|m| m.code).unwrap_or(default_mode),
        skills: mounts_override.and_then(|m| m.skills).unwrap_or(default_mode),
    };

    if let Some(health) = &manifest.health {
        for probe in [&health.liveness, &health.readiness].into_iter().flatten() {
            if !probe.script_is_valid() {
                errors.push(ValidationError::BadProbeScript(probe.script.clone()));
            }
        }
    }

    if !errors.is_empty() {
        return Err(ManifestError::Invalid(ValidationReport(errors)));
    }

    Ok(EffectiveConfig {
        profile,
        image,
        agent_type: manifest.agent_type,
        preinstall: hook(&manifest.preinstall, &overlay.preinstall),
        install: hook(&manifest.install, &overlay.install),
        postinstall: hook(&manifest.postinstall, &overlay.postinstall),
        update: hook(&manifest.update, &overlay.update),
        start: hook(&manifest.start, &overlay.start),
        agent: hook(&manifest.agent, &overlay.agent),
        cli: hook(&manifest.cli, &overlay.cli),
        run: hook(&manifest.run, &overlay.run),
        hosthook_aftercreation: overlay
            .hosthook_aftercreation
            .clone()
            .or_else(|| manifest.hosthook_aftercreation.clone()),
        hosthook_postinstall: overlay
            .hosthook_postinstall
            .clone()
            .or_else(|| manifest.hosthook_postinstall.clone()),
        env,
        expose,
        secrets,
        ports,
        volumes,
        mounts,
        health: manifest.health.clone(),
    })
}

#[cfg(test)]
#[path = "effective_tests.rs"]
mod tests;
