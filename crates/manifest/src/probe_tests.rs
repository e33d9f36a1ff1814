// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn defaults_apply() {
    let probe: ProbeSpec = serde_json::from_str(r#"{"script": "live.sh"}"#).unwrap();
    assert_eq!(probe.interval, 1);
    assert_eq!(probe.timeout, 5);
    assert_eq!(probe.failure_threshold, 5);
    assert_eq!(probe.success_threshold, 1);
}

#[test]
fn explicit_values_parse() {
    let probe: ProbeSpec = serde_json::from_str(
        r#"{"script": "live.sh", "interval": 2, "timeout": 3,
            "failureThreshold": 3, "successThreshold": 2}"#,
    )
    .unwrap();
    assert_eq!(probe.interval, 2);
    assert_eq!(probe.failure_threshold, 3);
}

#[parameterized(
    bare = { "live.sh", true },
    nested = { "scripts/live.sh", false },
    dotdot = { "..live.sh", false },
    traversal = { "../live.sh", false },
    empty = { "", false },
)]
fn script_validation(script: &str, valid: bool) {
    let probe = ProbeSpec {
        script: script.to_string(),
        interval: 1,
        timeout: 5,
        failure_threshold: 5,
        success_threshold: 1,
    };
    assert_eq!(probe.script_is_valid(), valid);
}

#[test]
fn health_block_is_optional_per_probe() {
    let health: HealthSpec =
        serde_json::from_str(r#"{"liveness": {"script": "live.sh"}}"#).unwrap();
    assert!(health.liveness.is_some());
    assert!(health.readiness.is_none());
}
