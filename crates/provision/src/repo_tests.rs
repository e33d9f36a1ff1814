// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn workspace_with_repo(agents: &[&str]) -> (tempfile::TempDir, RepoManager) {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());
    for agent in agents {
        let dir = paths.agent_source_dir("basic", agent);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("manifest.json"), r#"{"image": "img:1"}"#).unwrap();
    }
    // A directory without a manifest is not an agent.
    std::fs::create_dir_all(paths.repo_dir("basic").join("docs")).unwrap();
    let manager = RepoManager::new(paths);
    (temp, manager)
}

#[test]
fn predefined_map_resolves() {
    assert!(predefined_url("basic").unwrap().ends_with("basic.git"));
    assert!(predefined_url("nope").is_none());
}

#[test]
fn discover_agents_requires_manifest() {
    let (_temp, manager) = workspace_with_repo(&["demo", "helper"]);
    assert_eq!(manager.discover_agents("basic").unwrap(), vec!["demo", "helper"]);
    assert!(matches!(
        manager.discover_agents("missing"),
        Err(ProvisionError::UnknownRepo(_))
    ));
}

#[test]
fn enable_disable_round_trip() {
    let (_temp, manager) = workspace_with_repo(&["demo"]);
    assert!(manager.enable("basic").unwrap());
    assert!(!manager.enable("basic").unwrap());
    assert!(manager.list().unwrap().contains(&"basic".to_string()));
    assert!(manager.disable("basic").unwrap());
    assert!(!manager.disable("basic").unwrap());
}

#[test]
fn enable_unknown_repo_fails() {
    let (_temp, manager) = workspace_with_repo(&[]);
    assert!(matches!(manager.enable("ghost"), Err(ProvisionError::UnknownRepo(_))));
}

#[test]
fn find_agent_in_enabled_repos() {
    let (_temp, manager) = workspace_with_repo(&["demo"]);
    // Not found while the repo is disabled.
    assert!(matches!(manager.find_agent("demo"), Err(ProvisionError::AgentNotFound(_))));

    manager.enable("basic").unwrap();
    assert_eq!(manager.find_agent("demo").unwrap(), ("basic".to_string(), "demo".to_string()));
    assert_eq!(
        manager.find_agent("basic/demo").unwrap(),
        ("basic".to_string(), "demo".to_string())
    );
}

#[test]
fn ambiguous_agent_requires_qualification() {
    let (temp, manager) = workspace_with_repo(&["demo"]);
    let paths = WorkspacePaths::at(temp.path());
    let other = paths.agent_source_dir("extra", "demo");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join("manifest.json"), r#"{"image": "img:2"}"#).unwrap();

    manager.enable("basic").unwrap();
    manager.enable("extra").unwrap();

    match manager.find_agent("demo") {
        Err(ProvisionError::AmbiguousAgent { candidates, .. }) => {
            assert_eq!(candidates, vec!["basic/demo", "extra/demo"]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    // Qualified lookup resolves it.
    assert!(manager.find_agent("extra/demo").is_ok());
}

#[test]
fn remove_deletes_clone_and_disables() {
    let (temp, manager) = workspace_with_repo(&["demo"]);
    manager.enable("basic").unwrap();
    manager.remove("basic").unwrap();
    assert!(!WorkspacePaths::at(temp.path()).repo_dir("basic").exists());
    let enabled = EnabledRepos::load(&WorkspacePaths::at(temp.path())).unwrap();
    assert!(!enabled.contains("basic"));
}

#[test]
fn list_is_empty_without_repos_dir() {
    let temp = tempfile::tempdir().unwrap();
    let manager = RepoManager::new(WorkspacePaths::at(temp.path()));
    assert!(manager.list().unwrap().is_empty());
}
