// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn parses_key_value_lines() {
    let file = SecretsFile::parse("A=1\n# comment\n\nB = spaced \nBAD LINE\n");
    assert_eq!(file.raw("A"), Some("1"));
    assert_eq!(file.raw("B"), Some("spaced"));
    assert_eq!(file.raw("BAD LINE"), None);
}

#[test]
fn duplicate_keys_last_wins() {
    let file = SecretsFile::parse("A=1\nA=2\n");
    assert_eq!(file.raw("A"), Some("2"));
    assert_eq!(file.keys().count(), 1);
}

#[test]
fn resolves_alias_chain() {
    let file = SecretsFile::parse("A=$B\nB=$C\nC=value\n");
    assert_eq!(file.resolve("A"), "value");
    assert_eq!(file.resolve("C"), "value");
}

#[test]
fn alias_cycle_returns_empty_and_is_stable() {
    let file = SecretsFile::parse("A=$B\nB=$A\n");
    assert_eq!(file.resolve("A"), "");
    // Subsequent calls return the same result.
    assert_eq!(file.resolve("A"), "");
    assert_eq!(file.resolve("B"), "");
}

#[test]
fn dangling_alias_returns_empty() {
    let file = SecretsFile::parse("A=$MISSING\n");
    assert_eq!(file.resolve("A"), "");
    assert_eq!(file.resolve("NOPE"), "");
}

#[test]
fn self_alias_returns_empty() {
    let file = SecretsFile::parse("A=$A\n");
    assert_eq!(file.resolve("A"), "");
}

#[test]
fn set_and_save_round_trip() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("secrets");

    let mut file = SecretsFile::default();
    file.set("TOKEN", "abc");
    file.set("ALIAS", "$TOKEN");
    file.save(&path).unwrap();

    let loaded = SecretsFile::load(&path).unwrap();
    assert_eq!(loaded.raw("TOKEN"), Some("abc"));
    assert_eq!(loaded.resolve("ALIAS"), "abc");

    // Missing file loads as empty.
    let empty = SecretsFile::load(&temp.path().join("none")).unwrap();
    assert_eq!(empty.keys().count(), 0);
}

#[test]
#[serial]
fn sources_prefer_process_env() {
    std::env::set_var("BERTH_TEST_SECRET_PRIO", "from-env");
    let mut secrets = SecretsFile::default();
    secrets.set("BERTH_TEST_SECRET_PRIO", "from-file");
    let sources = SecretSources::from_parts(secrets, HashMap::new());
    assert_eq!(sources.get("BERTH_TEST_SECRET_PRIO").as_deref(), Some("from-env"));
    std::env::remove_var("BERTH_TEST_SECRET_PRIO");
}

#[test]
#[serial]
fn sources_fall_back_to_file_then_dotenv() {
    std::env::remove_var("BERTH_TEST_SECRET_FALLBACK");
    let mut secrets = SecretsFile::default();
    secrets.set("BERTH_TEST_SECRET_FALLBACK", "from-file");
    let mut dotenv = HashMap::new();
    dotenv.insert("BERTH_TEST_SECRET_FALLBACK".to_string(), "from-dotenv".to_string());
    dotenv.insert("ONLY_DOTENV".to_string(), "dot".to_string());

    let sources = SecretSources::from_parts(secrets, dotenv);
    assert_eq!(sources.get("BERTH_TEST_SECRET_FALLBACK").as_deref(), Some("from-file"));
    assert_eq!(sources.get("ONLY_DOTENV").as_deref(), Some("dot"));
    assert_eq!(sources.get("NOWHERE"), None);
}

#[test]
#[serial]
fn cycle_counts_as_absent_in_sources() {
    std::env::remove_var("BERTH_TEST_SECRET_CYCLE_A");
    let secrets = SecretsFile::parse(
        "BERTH_TEST_SECRET_CYCLE_A=$BERTH_TEST_SECRET_CYCLE_B\nBERTH_TEST_SECRET_CYCLE_B=$BERTH_TEST_SECRET_CYCLE_A\n",
    );
    let sources = SecretSources::from_parts(secrets, HashMap::new());
    assert_eq!(sources.get("BERTH_TEST_SECRET_CYCLE_A"), None);
}
