// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn manifest(json: &str) -> Manifest {
    serde_json::from_str(json).unwrap()
}

#[test]
fn top_level_only_resolution() {
    let m = manifest(
        r#"{"image": "img:1", "install": "npm ci", "ports": ["7000"],
            "env": ["LEVEL=info"]}"#,
    );
    let config = resolve(&m, Profile::Dev).unwrap();
    assert_eq!(config.image, "img:1");
    assert_eq!(config.install, vec!["npm ci"]);
    assert_eq!(config.ports, vec![PortSpec::random_host(7000)]);
    assert_eq!(config.mounts.code, MountMode::Rw);
    assert_eq!(config.env.entries[0].default.as_deref(), Some("info"));
}

#[test]
fn profile_env_extends_and_wins() {
    let m = manifest(
        r#"{"image": "img:1", "env": ["LEVEL=info", "TOKEN"],
            "profiles": {"prod": {"env": ["LEVEL=warn", "EXTRA=1"]}}}"#,
    );
    let config = resolve(&m, Profile::Prod).unwrap();
    let level = config.env.entries.iter().find(|e| e.inside_name == "LEVEL").unwrap();
    assert_eq!(level.default.as_deref(), Some("warn"));
    assert!(config.env.entries.iter().any(|e| e.inside_name == "TOKEN"));
    assert!(config.env.entries.iter().any(|e| e.inside_name == "EXTRA"));
}

#[test]
fn profile_hook_shallow_override() {
    let m = manifest(
        r#"{"image": "img:1", "install": "npm ci",
            "profiles": {"qa": {"install": ["npm ci --prod"]}}}"#,
    );
    assert_eq!(resolve(&m, Profile::Dev).unwrap().install, vec!["npm ci"]);
    assert_eq!(resolve(&m, Profile::Qa).unwrap().install, vec!["npm ci --prod"]);
}

#[test]
fn profile_secrets_extend() {
    let m = manifest(
        r#"{"image": "img:1", "secrets": ["SHARED"],
            "profiles": {"prod": {"secrets": ["PROD_API_KEY", "SHARED"]}}}"#,
    );
    let config = resolve(&m, Profile::Prod).unwrap();
    assert_eq!(config.secrets, vec!["SHARED", "PROD_API_KEY"]);
    // Other profiles see only the top-level set.
    assert_eq!(resolve(&m, Profile::Dev).unwrap().secrets, vec!["SHARED"]);
}

#[test]
fn mount_modes_follow_profile_and_override() {
    let m = manifest(r#"{"image": "img:1"}"#);
    assert_eq!(resolve(&m, Profile::Dev).unwrap().mounts.code, MountMode::Rw);
    assert_eq!(resolve(&m, Profile::Qa).unwrap().mounts.code, MountMode::Ro);
    assert_eq!(resolve(&m, Profile::Prod).unwrap().mounts.skills, MountMode::Ro);

    let m = manifest(
        r#"{"image": "img:1",
            "profiles": {"prod": {"mounts": {"code": "rw"}}}}"#,
    );
    let config = resolve(&m, Profile::Prod).unwrap();
    assert_eq!(config.mounts.code, MountMode::Rw);
    assert_eq!(config.mounts.skills, MountMode::Ro);
}

#[test]
fn missing_image_is_reported() {
    let m = manifest(r#"{"install": "npm ci"}"#);
    let err = resolve(&m, Profile::Dev).unwrap_err();
    let ManifestError::Invalid(report) = err else { panic!("expected Invalid") };
    assert!(report.0.contains(&ValidationError::MissingImage));
}

#[test]
fn all_port_errors_reported_at_once() {
    let m = manifest(r#"{"image": "img:1", "ports": ["bad", "0", "7000"]}"#);
    let err = resolve(&m, Profile::Dev).unwrap_err();
    let ManifestError::Invalid(report) = err else { panic!("expected Invalid") };
    let port_errors =
        report.0.iter().filter(|e| matches!(e, ValidationError::BadPort(_))).count();
    assert_eq!(port_errors, 2);
}

#[test]
fn entry_command_preference_order() {
    let m = manifest(r#"{"image": "i", "agent": "node agent.js", "start": "node s.js"}"#);
    let config = resolve(&m, Profile::Dev).unwrap();
    assert_eq!(config.entry_command().as_deref(), Some("node agent.js"));
    assert!(!config.uses_start_entry());

    let m = manifest(r#"{"image": "i", "start": "node s.js"}"#);
    let config = resolve(&m, Profile::Dev).unwrap();
    assert_eq!(config.entry_command().as_deref(), Some("node s.js"));
    assert!(config.uses_start_entry());

    let m = manifest(r#"{"image": "i"}"#);
    assert_eq!(resolve(&m, Profile::Dev).unwrap().entry_command(), None);
}

#[test]
fn bad_probe_script_is_reported() {
    let m = manifest(
        r#"{"image": "i", "health": {"liveness": {"script": "../evil.sh"}}}"#,
    );
    let err = resolve(&m, Profile::Dev).unwrap_err();
    let ManifestError::Invalid(report) = err else { panic!("expected Invalid") };
    assert!(matches!(report.0[0], ValidationError::BadProbeScript(_)));
}

#[test]
fn profile_ports_replace_top_level() {
    let m = manifest(
        r#"{"image": "i", "ports": ["7000"],
            "profiles": {"prod": {"ports": ["443:7000"]}}}"#,
    );
    assert_eq!(resolve(&m, Profile::Prod).unwrap().ports, vec![PortSpec::fixed(443, 7000)]);
    assert_eq!(resolve(&m, Profile::Dev).unwrap().ports, vec![PortSpec::random_host(7000)]);
}

#[test]
fn host_hooks_prefer_profile() {
    let m = manifest(
        r#"{"image": "i", "hosthook_aftercreation": "top.sh",
            "profiles": {"qa": {"hosthook_aftercreation": "qa.sh"}}}"#,
    );
    assert_eq!(
        resolve(&m, Profile::Qa).unwrap().hosthook_aftercreation.as_deref(),
        Some("qa.sh")
    );
    assert_eq!(
        resolve(&m, Profile::Dev).unwrap().hosthook_aftercreation.as_deref(),
        Some("top.sh")
    );
}
