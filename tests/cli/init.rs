// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace initialization and discovery.

use crate::prelude::*;

#[test]
fn init_creates_skeleton() {
    let project = Project::empty();
    project.berth().arg("init").assert().success();

    for dir in [".meta", ".meta/repos", ".meta/running", "agents", "code", "skills", "logs"] {
        assert!(project.exists(dir), "missing {dir}");
    }
}

#[test]
fn init_is_idempotent() {
    let project = Project::workspace();
    project.berth().arg("init").assert().success();
}

#[test]
fn commands_fail_outside_workspace_with_hint() {
    let project = Project::empty();
    project
        .berth()
        .args(["list", "agents"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("berth init"));
}

#[test]
fn commands_discover_workspace_from_subdirectory() {
    let project = Project::workspace();
    project.file("deep/nested/keep.txt", "");
    let mut cmd = project.berth();
    cmd.current_dir(project.root().join("deep/nested"));
    cmd.args(["list", "agents"]).assert().success();
}

#[test]
fn help_runs() {
    Project::empty().berth().arg("--help").assert().success();
}
