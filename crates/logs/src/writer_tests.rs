// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn read_events(writer: &LogWriter) -> Vec<Value> {
    std::fs::read_to_string(writer.path())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn appends_json_lines_with_schema_fields() {
    let temp = tempfile::tempdir().unwrap();
    let writer = LogWriter::new(temp.path(), "router");

    writer.append_log(LogLevel::Info, "boot_operation", json!({"action": "start"}));
    writer.append_log(LogLevel::Error, "crash", json!({"error": "x"}));

    let events = read_events(&writer);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["level"], "info");
    assert_eq!(events[0]["type"], "boot_operation");
    assert_eq!(events[0]["action"], "start");
    assert!(events[0]["ts"].as_str().unwrap().contains('T'));
    assert_eq!(events[1]["level"], "error");
}

#[test]
fn creates_log_directory() {
    let temp = tempfile::tempdir().unwrap();
    let writer = LogWriter::new(temp.path().join("deep/logs"), "watchdog");
    writer.log_boot_event("spawn", json!({"pid": 1}));
    assert!(writer.path().exists());
}

#[test]
fn schema_fields_cannot_be_clobbered() {
    let temp = tempfile::tempdir().unwrap();
    let writer = LogWriter::new(temp.path(), "router");
    writer.append_log(LogLevel::Warn, "custom", json!({"type": "spoofed", "level": "fake"}));
    let events = read_events(&writer);
    assert_eq!(events[0]["type"], "custom");
    assert_eq!(events[0]["level"], "warn");
}

#[test]
fn crash_event_carries_pid_and_memory() {
    let temp = tempfile::tempdir().unwrap();
    let writer = LogWriter::new(temp.path(), "router");
    writer.log_crash("panic", "boom", json!({"where": "test"}));
    let events = read_events(&writer);
    assert_eq!(events[0]["type"], "crash");
    assert_eq!(events[0]["errorType"], "panic");
    assert_eq!(events[0]["pid"], std::process::id());
    assert!(events[0]["memory"]["rssKb"].is_u64());
}

#[test]
fn shutdown_and_memory_and_signal_events() {
    let temp = tempfile::tempdir().unwrap();
    let writer = LogWriter::new(temp.path(), "watchdog");
    writer.log_shutdown("signal", 0, json!({}));
    writer.log_memory_usage();
    writer.log_process_signal("SIGTERM", "forwarding to child");

    let events = read_events(&writer);
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["shutdown", "memory_usage", "process_signal"]);
    assert_eq!(events[0]["exitCode"], 0);
    assert_eq!(events[2]["signal"], "SIGTERM");
}

#[test]
fn write_failure_is_swallowed() {
    // Point the writer at a path whose parent is a file: open must fail.
    let temp = tempfile::tempdir().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "file").unwrap();
    let writer = LogWriter::new(&blocker, "router");
    // Must not panic or return an error.
    writer.append_log(LogLevel::Info, "boot_operation", json!({}));
}
