// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn manifest(json: &str) -> Manifest {
    serde_json::from_str(json).unwrap()
}

#[test]
fn accepts_minimal_valid_manifest() {
    assert!(validate(&manifest(r#"{"image": "img:1"}"#), None).is_ok());
}

#[test]
fn rejects_both_container_and_image() {
    let report =
        validate(&manifest(r#"{"container": "a", "image": "b"}"#), None).unwrap_err();
    assert!(report.0.contains(&ValidationError::BothContainerAndImage));
}

#[test]
fn rejects_neither_container_nor_image() {
    let report = validate(&manifest(r#"{}"#), None).unwrap_err();
    assert!(report.0.contains(&ValidationError::MissingImage));
}

#[test]
fn rejects_empty_image() {
    let report = validate(&manifest(r#"{"image": "  "}"#), None).unwrap_err();
    assert!(report.0.contains(&ValidationError::EmptyImage));
}

#[test]
fn collects_every_error() {
    let report = validate(
        &manifest(
            r#"{
                "ports": ["bad"],
                "health": {"liveness": {"script": "../x"}},
                "enable": ["demo devel"],
                "volumes": {"data": "relative/path"},
                "profiles": {"staging": {}}
            }"#,
        ),
        None,
    )
    .unwrap_err();

    assert!(report.0.len() >= 5);
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::MissingImage)));
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::BadPort(_))));
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::BadProbeScript(_))));
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::BadEnableDirective { .. })));
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::RelativeVolumeTarget(_))));
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::UnknownProfile(_))));
}

#[test]
fn profile_port_errors_name_the_profile() {
    let report = validate(
        &manifest(r#"{"image": "i", "profiles": {"prod": {"ports": ["nope"]}}}"#),
        None,
    )
    .unwrap_err();
    assert!(report
        .0
        .iter()
        .any(|e| matches!(e, ValidationError::BadProfilePort { profile, .. } if profile == "prod")));
}

#[test]
fn hook_traversal_rejected() {
    for script in ["/abs/hook.sh", "../hook.sh", "hooks/../../x.sh"] {
        let report = validate(
            &manifest(&format!(r#"{{"image": "i", "hosthook_postinstall": "{}"}}"#, script)),
            None,
        )
        .unwrap_err();
        assert!(
            report.0.iter().any(|e| matches!(e, ValidationError::HookScriptTraversal { .. })),
            "expected traversal error for {script}"
        );
    }
}

#[test]
fn hook_existence_checked_against_agent_dir() {
    let temp = tempfile::tempdir().unwrap();
    let m = manifest(r#"{"image": "i", "hosthook_aftercreation": "hooks/created.sh"}"#);

    let report = validate(&m, Some(temp.path())).unwrap_err();
    assert!(report.0.iter().any(|e| matches!(e, ValidationError::HookScriptMissing { .. })));

    std::fs::create_dir_all(temp.path().join("hooks")).unwrap();
    std::fs::write(temp.path().join("hooks/created.sh"), "#!/bin/sh\n").unwrap();
    assert!(validate(&m, Some(temp.path())).is_ok());
}

#[test]
fn nested_hook_path_without_traversal_is_fine() {
    let m = manifest(r#"{"image": "i", "hosthook_postinstall": "hooks/post.sh"}"#);
    assert!(validate(&m, None).is_ok());
}

#[test]
fn default_profile_must_be_known() {
    let report =
        validate(&manifest(r#"{"image": "i", "defaultProfile": "blue"}"#), None).unwrap_err();
    assert!(report.0.contains(&ValidationError::UnknownProfile("blue".to_string())));
}
