// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The JSON-lines channel writer.

use chrono::Utc;
use serde_json::{json, Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Guard against recursive crash logging (a failing stderr write inside
/// `log_crash` must not re-enter it).
static IN_CRASH: AtomicBool = AtomicBool::new(false);

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

/// Append-only writer for one log channel.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    /// Writer for `logs/<channel>.log` under `logs_dir`.
    pub fn new(logs_dir: impl Into<PathBuf>, channel: &str) -> Self {
        Self { path: logs_dir.into().join(format!("{}.log", channel)) }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one event line. Failures are swallowed; logging never raises.
    pub fn append_log(&self, level: LogLevel, event_type: &str, fields: Value) {
        let mut object = Map::new();
        object.insert("ts".to_string(), json!(Utc::now().to_rfc3339()));
        object.insert("level".to_string(), json!(level.as_str()));
        object.insert("type".to_string(), json!(event_type));
        if let Value::Object(extra) = fields {
            for (key, value) in extra {
                object.entry(key).or_insert(value);
            }
        }
        self.write_line(&Value::Object(object));
    }

    /// A boot-time operation (`start`, `stop`, `enable`, ...).
    pub fn log_boot_event(&self, action: &str, details: Value) {
        self.append_log(LogLevel::Info, "boot_operation", json!({
            "action": action,
            "details": details,
        }));
    }

    /// Crash capture: error type, message, memory snapshot, pid, uptime.
    ///
    /// Re-entrancy guarded: a crash raised while logging a crash is dropped.
    pub fn log_crash(&self, error_type: &str, error: &str, extra: Value) {
        if IN_CRASH.swap(true, Ordering::SeqCst) {
            return;
        }
        self.append_log(LogLevel::Fatal, "crash", json!({
            "errorType": error_type,
            "error": error,
            "memory": memory_snapshot(),
            "pid": std::process::id(),
            "uptimeSecs": process_uptime_secs(),
            "extra": extra,
        }));
        IN_CRASH.store(false, Ordering::SeqCst);
    }

    pub fn log_shutdown(&self, reason: &str, exit_code: i32, extra: Value) {
        self.append_log(LogLevel::Info, "shutdown", json!({
            "reason": reason,
            "exitCode": exit_code,
            "extra": extra,
        }));
    }

    pub fn log_memory_usage(&self) {
        self.append_log(LogLevel::Info, "memory_usage", json!({
            "memory": memory_snapshot(),
            "pid": std::process::id(),
        }));
    }

    /// A delivered process signal (`SIGTERM`, `SIGINT`, ...).
    pub fn log_process_signal(&self, signal: &str, action: &str) {
        self.append_log(LogLevel::Warn, "process_signal", json!({
            "signal": signal,
            "action": action,
        }));
    }

    fn write_line(&self, value: &Value) {
        let Ok(line) = serde_json::to_string(value) else { return };
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));
        if let Err(e) = result {
            // Swallowed: logging must never crash the caller.
            tracing::debug!(path = %self.path.display(), error = %e, "log append failed");
        }
    }
}

/// Resident/virtual memory snapshot in kilobytes (zeros off Linux).
fn memory_snapshot() -> Value {
    let mut rss_kb = 0u64;
    let mut vm_kb = 0u64;
    if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
        for line in status.lines() {
            let field = |line: &str| {
                line.split_whitespace().nth(1).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0)
            };
            if line.starts_with("VmRSS:") {
                rss_kb = field(line);
            } else if line.starts_with("VmSize:") {
                vm_kb = field(line);
            }
        }
    }
    json!({"rssKb": rss_kb, "vmKb": vm_kb})
}

fn process_uptime_secs() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static STARTED: OnceLock<Instant> = OnceLock::new();
    STARTED.get_or_init(Instant::now).elapsed().as_secs()
}

/// Record the process start as early as possible so uptime is meaningful.
pub fn mark_process_start() {
    let _ = process_uptime_secs();
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
