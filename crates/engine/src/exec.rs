// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-container command execution: captured, interactive, and streamed.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};

/// Result of a captured exec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A streamed exec: the caller consumes stdout line by line.
///
/// Dropping the stream (or calling [`ExecStream::kill`]) releases the
/// underlying process.
pub struct ExecStream {
    pub(crate) child: Child,
    stdin: Option<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ExecStream {
    pub(crate) fn new(mut child: Child) -> Option<Self> {
        let stdout = child.stdout.take()?;
        let stdin = child.stdin.take();
        Some(Self { child, stdin, lines: BufReader::new(stdout).lines() })
    }

    /// Next stdout line, `None` at EOF.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Write to the process stdin (when it was piped).
    pub async fn write_stdin(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => {
                stdin.write_all(bytes).await?;
                stdin.flush().await
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "exec stream has no stdin",
            )),
        }
    }

    /// Wait for process exit and return its code.
    pub async fn wait(mut self) -> std::io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Kill the underlying exec process.
    pub async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Options shared by all exec modes.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Working directory inside the container (`-w`).
    pub workdir: Option<String>,
    /// Extra environment (`-e NAME=value`).
    pub env: Vec<(String, String)>,
    /// Kill the exec after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ExecOptions {
    pub fn in_dir(dir: impl Into<String>) -> Self {
        Self { workdir: Some(dir.into()), ..Self::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
