// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_workspace::SecretsFile;
use std::collections::HashMap;

fn sources(pairs: &[(&str, &str)]) -> SecretSources {
    let mut file = SecretsFile::default();
    for (key, value) in pairs {
        file.set(key, value);
    }
    SecretSources::from_parts(file, HashMap::new())
}

#[test]
fn validate_secrets_resolves_all_present() {
    let sources = sources(&[("A", "1"), ("B", "$A")]);
    let resolved =
        validate_secrets(&["A".to_string(), "B".to_string()], &sources).unwrap();
    assert_eq!(
        resolved,
        vec![("A".to_string(), "1".to_string()), ("B".to_string(), "1".to_string())]
    );
}

#[test]
fn validate_secrets_lists_every_missing_name() {
    let sources = sources(&[("PRESENT", "x")]);
    let err = validate_secrets(
        &["PRESENT".to_string(), "PROD_API_KEY".to_string(), "OTHER".to_string()],
        &sources,
    )
    .unwrap_err();
    match err {
        ProvisionError::MissingSecrets { missing } => {
            assert_eq!(missing, vec!["PROD_API_KEY", "OTHER"]);
        }
        other => panic!("expected MissingSecrets, got {other:?}"),
    }
}

#[test]
fn alias_cycle_counts_as_missing() {
    let sources = sources(&[("A", "$B"), ("B", "$A")]);
    let err = validate_secrets(&["A".to_string()], &sources).unwrap_err();
    assert!(matches!(err, ProvisionError::MissingSecrets { .. }));
}

#[test]
fn lifecycle_result_success_requires_every_step() {
    let mut result = LifecycleResult {
        steps: LifecycleStep::ALL.map(StepResult::ok).to_vec(),
        outcome: None,
    };
    assert!(result.success());
    assert_eq!(result.steps.len(), 12);

    result.steps[7] = StepResult::failed(LifecycleStep::Preinstall, "exit 1");
    assert!(!result.success());
    let failures: Vec<_> = result.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "preinstall hook");
}

#[test]
fn profile_env_pairs_fail_on_missing_required() {
    use berth_core::profile::Profile;
    let manifest: berth_manifest::Manifest =
        serde_json::from_str(r#"{"image": "i", "env": ["REQUIRED_THING"]}"#).unwrap();
    let config = berth_manifest::effective::resolve(&manifest, Profile::Dev).unwrap();
    let err = profile_env_pairs(&config, &sources(&[])).unwrap_err();
    assert!(matches!(err, ProvisionError::MissingRequiredEnv(name) if name == "REQUIRED_THING"));
}
