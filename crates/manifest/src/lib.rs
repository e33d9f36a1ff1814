// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-manifest: the declarative per-agent configuration.
//!
//! Parses `manifest.json`, normalizes its dynamically-shaped fields (env
//! specs, string-or-list hooks), validates it (reporting every problem at
//! once), and resolves the effective configuration for a profile:
//!
//! ```text
//! effective = defaults ∘ manifest-top-level ∘ profiles[active]
//! ```

pub mod effective;
pub mod env_spec;
pub mod manifest;
pub mod probe;
pub mod validate;

mod error;

pub use effective::{EffectiveConfig, MountModes};
pub use env_spec::{
    build_env_values, EnvEntry, EnvSpec, MissingRequiredEnv, NormalizedEnv, WildcardPattern,
};
pub use error::{ManifestError, ValidationError, ValidationReport};
pub use manifest::{Manifest, ProfileOverlay, StringOrList};
pub use probe::{HealthSpec, ProbeSpec};
pub use validate::validate;
