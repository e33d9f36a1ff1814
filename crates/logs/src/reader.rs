// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read side of the log: `last N` and `tail -f`-style follow.
//!
//! Both prefer the system `tail` binary and fall back to pure-Rust
//! behavior when it is unavailable.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Last `n` lines of a log file.
///
/// Prefers `tail -n`; falls back to reading and slicing.
pub fn last_lines(path: &Path, n: usize) -> std::io::Result<String> {
    if let Ok(output) = Command::new("tail")
        .arg("-n")
        .arg(n.to_string())
        .arg(path)
        .output()
    {
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
    }
    read_and_slice(path, n)
}

fn read_and_slice(path: &Path, n: usize) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

/// Follow a log file, invoking `on_line` per line until it returns `false`.
///
/// Prefers spawning `tail -f`; falls back to a polling loop watching file
/// length. Blocks the calling thread.
pub fn tail_follow(path: &Path, mut on_line: impl FnMut(&str) -> bool) -> std::io::Result<()> {
    if let Ok(mut child) = Command::new("tail")
        .arg("-f")
        .arg("-n")
        .arg("0")
        .arg(path)
        .stdout(std::process::Stdio::piped())
        .spawn()
    {
        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let line = line?;
                if !on_line(&line) {
                    break;
                }
            }
        }
        let _ = child.kill();
        let _ = child.wait();
        return Ok(());
    }
    poll_follow(path, &mut on_line)
}

fn poll_follow(path: &Path, on_line: &mut impl FnMut(&str) -> bool) -> std::io::Result<()> {
    let mut offset = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    loop {
        let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if len < offset {
            // Truncated or rotated: start over from the beginning.
            offset = 0;
        }
        if len > offset {
            let mut file = std::fs::File::open(path)?;
            file.seek(SeekFrom::Start(offset))?;
            let mut chunk = String::new();
            file.read_to_string(&mut chunk)?;
            offset = len;
            for line in chunk.lines() {
                if !on_line(line) {
                    return Ok(());
                }
            }
        }
        std::thread::sleep(Duration::from_millis(250));
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
