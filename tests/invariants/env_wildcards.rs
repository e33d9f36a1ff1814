// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wildcard safety carve-out: `*` never matches API keys.

use berth_manifest::EnvSpec;
use std::collections::HashMap;

fn normalized(json: &str) -> berth_manifest::NormalizedEnv {
    serde_json::from_str::<EnvSpec>(json).unwrap().normalize()
}

#[test]
fn bare_star_never_matches_api_key_names() {
    let spec = normalized(r#"["*"]"#);
    let pattern = &spec.wildcards[0];
    for name in [
        "OPENAI_API_KEY",
        "SOME_APIKEY",
        "apikey_lower",
        "MY_API_KEY_BACKUP",
        "XAPIKEYX",
    ] {
        assert!(!pattern.matches(name), "'{name}' must never match bare *");
    }
    for name in ["HOME", "PATH", "API_URL", "KEYBOARD"] {
        assert!(pattern.matches(name), "'{name}' should match bare *");
    }
}

#[test]
fn explicit_listing_still_works() {
    let spec = normalized(r#"["PROD_API_KEY"]"#);
    assert_eq!(spec.entries.len(), 1);
    assert_eq!(spec.entries[0].inside_name, "PROD_API_KEY");
    assert!(spec.entries[0].required);
}

#[test]
fn expansion_forwards_matches_under_their_own_names() {
    let spec = normalized(r#"["DB_*"]"#);
    let mut host = HashMap::new();
    host.insert("DB_HOST".to_string(), "localhost".to_string());
    host.insert("DB_PORT".to_string(), "5432".to_string());
    host.insert("CACHE_HOST".to_string(), "other".to_string());

    let mut forwarded = spec.expand_wildcards(&host);
    forwarded.sort();
    assert_eq!(
        forwarded,
        vec![
            ("DB_HOST".to_string(), "localhost".to_string()),
            ("DB_PORT".to_string(), "5432".to_string()),
        ]
    );
}
