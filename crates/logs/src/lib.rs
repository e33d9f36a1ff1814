// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-logs: append-only JSON-lines event logging.
//!
//! One writer per channel (`logs/<channel>.log`), one JSON object per line:
//!
//! ```json
//! {"ts":"2026-01-15T12:00:00Z","level":"info","type":"boot_operation",...}
//! ```
//!
//! Logging must never crash the caller: every write failure is swallowed,
//! crash capture is re-entrancy guarded, and console output is EPIPE-safe.
//! The read side (`last`/`tail`) prefers the system `tail` and falls back
//! to pure-Rust implementations.

pub mod console;
pub mod reader;
pub mod writer;

pub use console::{safe_eprintln, safe_println};
pub use reader::{last_lines, tail_follow};
pub use writer::{mark_process_start, LogLevel, LogWriter};
