// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alias resolution always terminates.

use berth_workspace::SecretsFile;

#[test]
fn alias_cycle_resolves_to_empty_repeatedly() {
    let file = SecretsFile::parse("A=$B\nB=$A\n");
    for _ in 0..10 {
        assert_eq!(file.resolve("A"), "");
        assert_eq!(file.resolve("B"), "");
    }
}

#[test]
fn long_chain_terminates_with_value() {
    let mut body = String::new();
    for i in 0..100 {
        body.push_str(&format!("K{}=$K{}\n", i, i + 1));
    }
    body.push_str("K100=final\n");
    let file = SecretsFile::parse(&body);
    assert_eq!(file.resolve("K0"), "final");
}

#[test]
fn every_key_resolves_to_a_finite_string() {
    let file = SecretsFile::parse("A=$B\nB=$C\nC=$A\nD=ok\nE=$D\nF=$GHOST\n");
    for key in ["A", "B", "C", "D", "E", "F", "UNKNOWN"] {
        // No panic, no hang; cycles and danglers are empty.
        let resolved = file.resolve(key);
        match key {
            "D" | "E" => assert_eq!(resolved, "ok"),
            _ => assert_eq!(resolved, ""),
        }
    }
}
