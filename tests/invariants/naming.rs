// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container-name determinism across the public API.

use berth_core::naming::container_name;
use std::path::Path;

#[test]
fn name_is_a_pure_function_of_inputs() {
    let root = Path::new("/home/dev/project");
    let a = container_name("basic", "demo", root);
    let b = container_name("basic", "demo", root);
    assert_eq!(a, b);
}

#[test]
fn distinct_inputs_yield_distinct_names() {
    let root = Path::new("/home/dev/project");
    let other_root = Path::new("/home/dev/other");
    let base = container_name("basic", "demo", root);
    assert_ne!(base, container_name("basic", "demo", other_root));
    assert_ne!(base, container_name("basic", "other", root));
    assert_ne!(base, container_name("other", "demo", root));
}

#[test]
fn name_matches_documented_pattern() {
    let name = container_name("basic", "demo", Path::new("/any/where"));
    let suffix = name.strip_prefix("orch_basic_demo_").expect("prefix");
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}
