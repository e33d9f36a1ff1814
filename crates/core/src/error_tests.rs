// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn failure_kind_display_is_snake_case() {
    assert_eq!(FailureKind::Config.to_string(), "config_error");
    assert_eq!(FailureKind::MissingSecret.to_string(), "missing_secret");
    assert_eq!(FailureKind::RouterUpstream.to_string(), "router_upstream");
    assert_eq!(FailureKind::InternalInvariant.to_string(), "internal_invariant");
}

#[test]
fn failure_kind_serde_round_trip() {
    let json = serde_json::to_string(&FailureKind::HealthProbeFailed).unwrap();
    assert_eq!(json, "\"health_probe_failed\"");
    let parsed: FailureKind = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, FailureKind::HealthProbeFailed);
}

#[test]
fn exit_codes_are_distinct() {
    assert_ne!(exit_code::OK, exit_code::FAILURE);
    assert_ne!(exit_code::FAILURE, exit_code::PORT_OR_PERMISSION);
    assert!(exit_code::FATAL >= 100);
}
