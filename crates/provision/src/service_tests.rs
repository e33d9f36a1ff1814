// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_core::naming::container_name;
use berth_core::profile::Profile;
use berth_manifest::{effective, Manifest};
use berth_workspace::WorkspacePaths;
use serde_json::json;

fn context(temp: &tempfile::TempDir, manifest_json: &str) -> AgentContext {
    let manifest: Manifest = serde_json::from_str(manifest_json).unwrap();
    let config = effective::resolve(&manifest, Profile::Dev).unwrap();
    let paths = WorkspacePaths::at(temp.path());
    AgentContext {
        record_name: "demo".to_string(),
        repo_name: "basic".to_string(),
        agent_name: "demo".to_string(),
        container_name: container_name("basic", "demo", temp.path()),
        profile: Profile::Dev,
        config,
        paths,
        router_port: 8088,
    }
}

#[test]
fn compose_sets_labels_env_and_dual_mount() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(&temp, r#"{"image": "example/demo:1", "agent": "node agent.js"}"#);

    let spec = compose_create_spec(&ctx, &[], &[], Some(12345)).unwrap();
    assert_eq!(spec.image, "example/demo:1");
    assert!(spec.name.starts_with("orch_basic_demo_"));

    let label = |key: &str| {
        spec.labels.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap()
    };
    assert_eq!(label("orch"), "true");
    assert_eq!(label("orch.agent"), "demo");
    assert_eq!(label("orch.repo"), "basic");
    assert_eq!(label("orch.profile"), "dev");

    let env = |key: &str| {
        spec.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()).unwrap()
    };
    assert_eq!(env("AGENT_NAME"), "demo");
    assert_eq!(env("MODULE_PATH"), "/code/modules");
    assert_eq!(env("ORCH_MCP_CONFIG_PATH"), "/tmp/orch/mcp-config.json");
    assert_eq!(env("ORCH_ROUTER_PORT"), "8088");
    assert!(env("WORKSPACE_PATH").ends_with("/agents/demo"));

    // Dual modules mount: same host dir, two container paths.
    let modules: Vec<&Bind> = spec
        .binds
        .iter()
        .filter(|b| b.container == "/code/modules" || b.container == "/framework/modules")
        .collect();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].host, modules[1].host);
    assert!(modules[0].host.ends_with("/agents/demo/modules"));

    // Cwd passthrough: host path == container path.
    assert!(spec.binds.iter().any(|b| b.host == b.container && b.container.ends_with("/agents/demo")));

    // Pinned agent port.
    assert!(spec.ports.contains(&PortSpec::fixed(12345, AGENT_HTTP_PORT)));
    assert_eq!(spec.command.as_deref(), Some("node agent.js"));
}

#[test]
fn code_mount_mode_follows_profile() {
    let temp = tempfile::tempdir().unwrap();
    let mut ctx = context(&temp, r#"{"image": "i"}"#);
    let spec = compose_create_spec(&ctx, &[], &[], None).unwrap();
    let code = spec.binds.iter().find(|b| b.container == "/code").unwrap();
    assert_eq!(code.mode, berth_core::profile::MountMode::Rw);

    let manifest: Manifest = serde_json::from_str(r#"{"image": "i"}"#).unwrap();
    ctx.config = effective::resolve(&manifest, Profile::Prod).unwrap();
    ctx.profile = Profile::Prod;
    let spec = compose_create_spec(&ctx, &[], &[], None).unwrap();
    let code = spec.binds.iter().find(|b| b.container == "/code").unwrap();
    assert_eq!(code.mode, berth_core::profile::MountMode::Ro);
}

#[test]
fn secrets_and_profile_env_are_injected() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(&temp, r#"{"image": "i"}"#);
    let secrets = vec![("PROD_API_KEY".to_string(), "sk-1".to_string())];
    let profile_env = vec![("LEVEL".to_string(), "warn".to_string())];
    let spec = compose_create_spec(&ctx, &secrets, &profile_env, None).unwrap();
    assert!(spec.env.contains(&("PROD_API_KEY".to_string(), "sk-1".to_string())));
    assert!(spec.env.contains(&("LEVEL".to_string(), "warn".to_string())));
}

#[test]
fn manifest_port_with_explicit_host_is_kept() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(&temp, r#"{"image": "i", "ports": ["9001:7000", "5432"]}"#);
    assert_eq!(explicit_agent_port(&ctx.config.ports), Some(9001));

    let spec = compose_create_spec(&ctx, &[], &[], Some(9001)).unwrap();
    assert!(spec.ports.contains(&PortSpec::fixed(9001, 7000)));
    assert!(spec.ports.contains(&PortSpec::random_host(5432)));
    // No duplicate 7000 mapping was added.
    assert_eq!(spec.ports.iter().filter(|p| p.container_port == 7000).count(), 1);
}

#[test]
fn spec_match_detects_drift() {
    let temp = tempfile::tempdir().unwrap();
    let ctx = context(&temp, r#"{"image": "example/demo:1"}"#);
    let spec = compose_create_spec(&ctx, &[], &[], None).unwrap();

    let binds: Vec<serde_json::Value> = spec
        .binds
        .iter()
        .map(|b| json!({"Source": b.host, "Destination": b.container}))
        .collect();
    let labels: serde_json::Map<String, serde_json::Value> = spec
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), json!(v)))
        .collect();

    let inspect = json!({
        "Config": {"Image": "example/demo:1", "Labels": labels},
        "Mounts": binds,
    });
    assert!(spec_matches_inspect(&spec, &inspect));

    // Different image: drift.
    let mut other = inspect.clone();
    other["Config"]["Image"] = json!("example/demo:2");
    assert!(!spec_matches_inspect(&spec, &other));

    // Missing mount: drift.
    let mut other = inspect.clone();
    other["Mounts"].as_array_mut().unwrap().pop();
    assert!(!spec_matches_inspect(&spec, &other));

    // Changed label: drift.
    let mut other = inspect;
    other["Config"]["Labels"]["orch.profile"] = json!("prod");
    assert!(!spec_matches_inspect(&spec, &other));
}

#[test]
fn allocated_ports_are_in_range_and_free() {
    for _ in 0..5 {
        let port = allocate_host_port().unwrap();
        assert!((HOST_PORT_RANGE.0..HOST_PORT_RANGE.1).contains(&port));
    }
}

#[test]
fn dedup_env_last_wins() {
    let deduped = dedup_env(vec![
        ("A".to_string(), "1".to_string()),
        ("B".to_string(), "2".to_string()),
        ("A".to_string(), "3".to_string()),
    ]);
    assert_eq!(
        deduped,
        vec![("A".to_string(), "3".to_string()), ("B".to_string(), "2".to_string())]
    );
}
