// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets and profile management.

use crate::prelude::*;

#[test]
fn set_list_unset_round_trip() {
    let project = Project::workspace();

    project
        .berth()
        .args(["secrets", "set", "API_TOKEN", "s3cret"])
        .assert()
        .success();
    project
        .berth()
        .args(["secrets", "set", "ALIASED", "$API_TOKEN"])
        .assert()
        .success();

    // Values never appear in the listing.
    let assert = project.berth().args(["secrets", "list"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("API_TOKEN"));
    assert!(stdout.contains("alias"));
    assert!(!stdout.contains("s3cret"));

    // The file itself holds the raw lines.
    let raw = project.read(".meta/secrets");
    assert!(raw.contains("API_TOKEN=s3cret"));
    assert!(raw.contains("ALIASED=$API_TOKEN"));

    project.berth().args(["secrets", "unset", "API_TOKEN"]).assert().success();
    assert!(!project.read(".meta/secrets").contains("API_TOKEN=s3cret"));
}

#[test]
fn profile_defaults_to_dev_and_persists() {
    let project = Project::workspace();
    project
        .berth()
        .arg("profile")
        .assert()
        .success()
        .stdout(predicates::str::contains("dev"));

    project.berth().args(["profile", "prod"]).assert().success();
    assert_eq!(project.read(".meta/profile").trim(), "prod");
    project
        .berth()
        .arg("profile")
        .assert()
        .success()
        .stdout(predicates::str::contains("prod"));
}

#[test]
fn unknown_profile_rejected() {
    let project = Project::workspace();
    project
        .berth()
        .args(["profile", "staging"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("staging"));
}
