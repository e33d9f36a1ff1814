// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start-path failure behavior (no real container engine in CI).

use crate::prelude::*;

#[test]
fn start_without_engine_fails_with_runtime_hint() {
    let project = Project::workspace();
    project.seed_agent("basic", "demo", r#"{"image": "example/demo:1"}"#);
    project.berth().args(["enable", "agent", "demo"]).assert().success();

    let mut cmd = project.berth();
    // A PATH with no engine binaries at all.
    cmd.env("PATH", project.root().join("stub-missing").display().to_string());
    cmd.args(["start", "demo", "8088"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("container runtime"));
}

#[test]
fn missing_required_secret_aborts_before_container_hooks() {
    let project = Project::workspace();
    project.seed_agent(
        "basic",
        "myagent",
        r#"{
            "image": "example/demo:1",
            "install": "echo installing > /tmp/installed",
            "profiles": {"prod": {"secrets": ["PROD_API_KEY"]}}
        }"#,
    );
    project.berth().args(["enable", "agent", "myagent"]).assert().success();
    project.berth().args(["profile", "prod"]).assert().success();

    let mut cmd = project.berth();
    cmd.env("PATH", project.stub_engine_path());
    cmd.env("CONTAINER_RUNTIME", "docker");
    cmd.env_remove("PROD_API_KEY");
    let assert = cmd.args(["start", "myagent", "8088"]).assert().failure().code(3);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("PROD_API_KEY"), "names the secret: {stderr}");
    assert!(
        stderr.contains("environment, secrets file, .env file"),
        "lists the sources: {stderr}"
    );
}

#[test]
fn missing_secret_is_satisfied_by_secrets_file() {
    let project = Project::workspace();
    project.seed_agent(
        "basic",
        "myagent",
        r#"{"image": "example/demo:1", "profiles": {"prod": {"secrets": ["PROD_API_KEY"]}}}"#,
    );
    project.berth().args(["enable", "agent", "myagent"]).assert().success();
    project.berth().args(["profile", "prod"]).assert().success();
    project
        .berth()
        .args(["secrets", "set", "PROD_API_KEY", "sk-123"])
        .assert()
        .success();

    // The stub engine fails container creation, so the start still fails,
    // but past the secret gate (exit 1, not 3).
    let mut cmd = project.berth();
    cmd.env("PATH", project.stub_engine_path());
    cmd.env("CONTAINER_RUNTIME", "docker");
    cmd.args(["start", "myagent", "8088"]).assert().failure().code(1);
}

#[test]
fn start_unknown_agent_fails_with_hint() {
    let project = Project::workspace();
    let mut cmd = project.berth();
    cmd.env("PATH", project.stub_engine_path());
    cmd.env("CONTAINER_RUNTIME", "docker");
    cmd.args(["start", "ghost"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("enable agent"));
}

#[test]
fn stop_without_router_reports_not_running() {
    let project = Project::workspace();
    project
        .berth()
        .arg("stop")
        .assert()
        .success()
        .stdout(predicates::str::contains("not running"));
}

#[test]
fn status_runs_without_router() {
    let project = Project::workspace();
    project
        .berth()
        .arg("status")
        .assert()
        .success()
        .stdout(predicates::str::contains("not running"));
}
