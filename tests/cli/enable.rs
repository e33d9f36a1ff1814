// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent enablement against seeded repos.

use crate::prelude::*;

const DEMO_MANIFEST: &str = r#"{"image": "example/demo:1", "ports": ["7000"]}"#;

#[test]
fn enable_writes_agent_record() {
    let project = Project::workspace();
    project.seed_agent("basic", "demo", DEMO_MANIFEST);

    project
        .berth()
        .args(["enable", "agent", "demo"])
        .assert()
        .success()
        .stdout(predicates::str::contains("enabled"));

    let registry: serde_json::Value =
        serde_json::from_str(&project.read(".meta/agents.json")).unwrap();
    let record = &registry["demo"];
    assert_eq!(record["repoName"], "basic");
    assert_eq!(record["agentName"], "demo");
    assert_eq!(record["containerImage"], "example/demo:1");

    let container = record["containerName"].as_str().unwrap();
    let re = regex_lite(container);
    assert!(re, "container name '{container}' should match orch_basic_demo_<8 hex>");

    // Work dir and code symlink exist.
    assert!(project.exists("agents/demo"));
    assert!(project.root().join("code/demo").symlink_metadata().is_ok());
}

// Small hand check instead of a regex dependency.
fn regex_lite(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("orch_basic_demo_") else { return false };
    rest.len() == 8 && rest.chars().all(|c| c.is_ascii_hexdigit())
}

#[test]
fn enable_is_idempotent() {
    let project = Project::workspace();
    project.seed_agent("basic", "demo", DEMO_MANIFEST);

    project.berth().args(["enable", "agent", "demo"]).assert().success();
    project
        .berth()
        .args(["enable", "agent", "demo"])
        .assert()
        .success()
        .stdout(predicates::str::contains("already enabled"));
}

#[test]
fn enable_with_alias_uses_alias_as_record_name() {
    let project = Project::workspace();
    project.seed_agent("basic", "demo", DEMO_MANIFEST);

    project
        .berth()
        .args(["enable", "agent", "demo", "as", "mydemo"])
        .assert()
        .success();

    let registry: serde_json::Value =
        serde_json::from_str(&project.read(".meta/agents.json")).unwrap();
    assert!(registry.get("mydemo").is_some());
    assert!(registry.get("demo").is_none());
}

#[test]
fn enable_unknown_agent_fails_with_hint() {
    let project = Project::workspace();
    project
        .berth()
        .args(["enable", "agent", "ghost"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("repo enable"));
}

#[test]
fn enable_invalid_manifest_reports_all_errors() {
    let project = Project::workspace();
    project.seed_agent(
        "basic",
        "broken",
        r#"{"ports": ["bad", "99999"], "health": {"liveness": {"script": "../x"}}}"#,
    );

    let assert = project.berth().args(["enable", "agent", "broken"]).assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("container") || stderr.contains("image"), "image error: {stderr}");
    assert!(stderr.contains("port"), "port errors: {stderr}");
    assert!(stderr.contains("probe script"), "probe error: {stderr}");
}

#[test]
fn enable_expands_dependencies() {
    let project = Project::workspace();
    project.seed_agent(
        "basic",
        "app",
        r#"{"image": "example/app:1", "enable": ["helper"]}"#,
    );
    project.file(
        ".meta/repos/basic/helper/manifest.json",
        r#"{"image": "example/helper:1", "type": "service"}"#,
    );

    project.berth().args(["enable", "agent", "app"]).assert().success();

    let registry: serde_json::Value =
        serde_json::from_str(&project.read(".meta/agents.json")).unwrap();
    assert!(registry.get("app").is_some());
    assert!(registry.get("helper").is_some());
    assert_eq!(registry["helper"]["type"], "service");
}

#[test]
fn disable_removes_record_and_links() {
    let project = Project::workspace();
    project.seed_agent("basic", "demo", DEMO_MANIFEST);
    project.berth().args(["enable", "agent", "demo"]).assert().success();

    let mut cmd = project.berth();
    cmd.env("PATH", project.stub_engine_path());
    cmd.env("CONTAINER_RUNTIME", "docker");
    cmd.args(["disable", "demo"]).assert().success();

    let registry: serde_json::Value =
        serde_json::from_str(&project.read(".meta/agents.json")).unwrap();
    assert!(registry.get("demo").is_none());
    assert!(project.root().join("code/demo").symlink_metadata().is_err());
}
