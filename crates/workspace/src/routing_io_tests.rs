// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use berth_core::routing::Route;

fn demo_table(port: u16) -> RoutingTable {
    let mut table = RoutingTable::new(port);
    table.routes.insert(
        "demo".to_string(),
        Route {
            container: "orch_basic_demo_00000000".to_string(),
            host_port: 32768,
            repo: "basic".to_string(),
            agent: "demo".to_string(),
            host_path: "/ws/agents/demo".to_string(),
        },
    );
    table
}

#[test]
fn write_then_read_round_trips() {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());

    write_routing_table(&paths, &demo_table(8088)).unwrap();
    let loaded = read_routing_table(&paths).unwrap().unwrap();
    assert_eq!(loaded.port, 8088);
    assert_eq!(loaded.route("demo").unwrap().host_port, 32768);
}

#[test]
fn missing_table_reads_as_none_and_empty() {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());
    assert!(read_routing_table(&paths).unwrap().is_none());

    let reader = RoutingReader::new(&paths);
    assert_eq!(reader.current(), RoutingTable::default());
}

#[test]
fn reader_sees_rewrites_after_ttl() {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());
    write_routing_table(&paths, &demo_table(8088)).unwrap();

    let reader = RoutingReader::with_ttl(&paths, Duration::from_millis(0));
    assert_eq!(reader.current().port, 8088);

    // Rewrite; with a zero TTL the next read re-checks the mtime.
    write_routing_table(&paths, &demo_table(9090)).unwrap();
    // The rename updates the mtime; allow a couple of polls for coarse
    // filesystem timestamps.
    let mut seen = reader.current().port;
    for _ in 0..50 {
        if seen == 9090 {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
        seen = reader.current().port;
    }
    assert_eq!(seen, 9090);
}

#[test]
fn reader_caches_within_ttl() {
    let temp = tempfile::tempdir().unwrap();
    let paths = WorkspacePaths::at(temp.path());
    write_routing_table(&paths, &demo_table(8088)).unwrap();

    let reader = RoutingReader::with_ttl(&paths, Duration::from_secs(60));
    assert_eq!(reader.current().port, 8088);

    write_routing_table(&paths, &demo_table(9090)).unwrap();
    // Within TTL the cached copy is served.
    assert_eq!(reader.current().port, 8088);
}
