// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine operations over the runtime CLI.

use crate::create::CreateSpec;
use crate::error::EngineError;
use crate::exec::{ExecOptions, ExecOutput, ExecStream};
use crate::runtime::ContainerRuntime;
use berth_core::naming::labels;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default grace period before a stop falls back to kill.
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Coarse container state from `inspect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub running: bool,
    /// Raw status string (`created`, `running`, `exited`, ...).
    pub status: String,
}

/// Uniform wrapper over one container engine CLI.
#[derive(Debug, Clone)]
pub struct Engine {
    runtime: ContainerRuntime,
}

impl Engine {
    /// Detect the runtime (podman preferred, `CONTAINER_RUNTIME` override).
    pub fn detect() -> Result<Self, EngineError> {
        Ok(Self { runtime: ContainerRuntime::detect()? })
    }

    pub fn with_runtime(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    /// Run an engine subcommand, capturing output. Returns trimmed stdout.
    async fn run(&self, args: &[&str], timeout: Option<Duration>) -> Result<String, EngineError> {
        let command = args.first().copied().unwrap_or("");
        tracing::debug!(engine = self.runtime.binary(), ?args, "engine call");

        let child = Command::new(self.runtime.binary())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::EngineUnavailable
                } else {
                    EngineError::Spawn(e)
                }
            })?;

        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(EngineError::Timeout { command: command.to_string(), timeout: limit });
                }
            },
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(EngineError::classify(command, None, "", &stderr))
        }
    }

    /// Create a container (without starting it). Returns the container id.
    pub async fn create(&self, spec: &CreateSpec) -> Result<String, EngineError> {
        let args = spec.to_args();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.run(&arg_refs, None).await {
            Ok(id) => Ok(id),
            Err(EngineError::CommandFailed { command, stderr }) => {
                Err(EngineError::classify(&command, Some(&spec.image), &spec.name, &stderr))
            }
            Err(other) => Err(other),
        }
    }

    pub async fn start(&self, name: &str) -> Result<(), EngineError> {
        self.run(&["start", name], None).await.map(|_| ())
    }

    /// Stop with a grace period, then force-kill if the stop itself hangs.
    pub async fn stop(&self, name: &str, timeout: Option<Duration>) -> Result<(), EngineError> {
        let grace = timeout.unwrap_or(DEFAULT_STOP_TIMEOUT);
        let secs = grace.as_secs().to_string();
        let args = ["stop", "-t", secs.as_str(), name];
        // Allow the CLI a margin beyond the in-engine grace period.
        match self.run(&args, Some(grace + Duration::from_secs(5))).await {
            Ok(_) => Ok(()),
            Err(EngineError::Timeout { .. }) => {
                tracing::warn!(container = name, "stop timed out, killing");
                self.run(&["kill", name], Some(Duration::from_secs(10))).await.map(|_| ())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn remove(&self, name: &str, force: bool) -> Result<(), EngineError> {
        let result = if force {
            self.run(&["rm", "-f", name], None).await
        } else {
            self.run(&["rm", name], None).await
        };
        match result {
            Ok(_) | Err(EngineError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Full `inspect` JSON for a container.
    pub async fn inspect(&self, name: &str) -> Result<serde_json::Value, EngineError> {
        let raw = self.run(&["inspect", name], None).await?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| EngineError::BadOutput(e.to_string()))?;
        // Both engines wrap the result in a one-element array.
        match value {
            serde_json::Value::Array(mut items) if !items.is_empty() => Ok(items.remove(0)),
            other => Ok(other),
        }
    }

    /// Coarse state, `None` when the container does not exist.
    pub async fn state(&self, name: &str) -> Result<Option<ContainerState>, EngineError> {
        match self.inspect(name).await {
            Ok(json) => {
                let state = &json["State"];
                Ok(Some(ContainerState {
                    running: state["Running"].as_bool().unwrap_or(false),
                    status: state["Status"].as_str().unwrap_or("unknown").to_string(),
                }))
            }
            Err(EngineError::NotFound(_)) | Err(EngineError::CommandFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn is_running(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.state(name).await?.map(|s| s.running).unwrap_or(false))
    }

    /// Names of orchestrator-managed containers (`orch=true` label filter).
    pub async fn ps(&self, all: bool) -> Result<Vec<String>, EngineError> {
        let filter = format!("label={}", labels::MANAGED_FILTER);
        let mut args = vec!["ps", "--filter", filter.as_str(), "--format", "{{.Names}}"];
        if all {
            args.insert(1, "-a");
        }
        let raw = self.run(&args, None).await?;
        Ok(raw.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
    }

    /// Host port the engine published for `container_port`, if any.
    ///
    /// Parses `port <name> <port>` output, which is either
    /// `0.0.0.0:32768` or `:::32768`.
    pub async fn host_port_for(
        &self,
        name: &str,
        container_port: u16,
    ) -> Result<Option<u16>, EngineError> {
        let port = container_port.to_string();
        let raw = match self.run(&["port", name, port.as_str()], None).await {
            Ok(raw) => raw,
            Err(EngineError::NotFound(_)) | Err(EngineError::CommandFailed { .. }) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };
        Ok(parse_published_port(&raw))
    }

    /// Exec a command and capture output.
    pub async fn exec_captured(
        &self,
        name: &str,
        command: &[&str],
        opts: &ExecOptions,
    ) -> Result<ExecOutput, EngineError> {
        let args = self.exec_args(name, command, opts, false);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let child = Command::new(self.runtime.binary())
            .args(&arg_refs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = match opts.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(EngineError::Timeout { command: "exec".to_string(), timeout: limit });
                }
            },
            None => child.wait_with_output().await?,
        };

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    /// Exec a shell script string via `sh -c`, capturing output.
    pub async fn exec_shell(
        &self,
        name: &str,
        script: &str,
        opts: &ExecOptions,
    ) -> Result<ExecOutput, EngineError> {
        self.exec_captured(name, &["sh", "-c", script], opts).await
    }

    /// Exec inheriting the caller's stdio (webtty-style interactive use).
    pub async fn exec_interactive(
        &self,
        name: &str,
        command: &[&str],
        opts: &ExecOptions,
    ) -> Result<i32, EngineError> {
        let args = self.exec_args(name, command, opts, true);
        let status = Command::new(self.runtime.binary())
            .args(args.iter().map(String::as_str))
            .status()
            .await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Exec with stdout streamed line-by-line to the caller.
    pub async fn exec_streamed(
        &self,
        name: &str,
        command: &[&str],
        opts: &ExecOptions,
    ) -> Result<ExecStream, EngineError> {
        let args = self.exec_args(name, command, opts, false);
        let child = Command::new(self.runtime.binary())
            .args(args.iter().map(String::as_str))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        ExecStream::new(child)
            .ok_or_else(|| EngineError::BadOutput("exec stream had no stdout".to_string()))
    }

    /// Copy a host path into the container.
    pub async fn cp(&self, host_path: &str, name: &str, dest: &str) -> Result<(), EngineError> {
        let target = format!("{}:{}", name, dest);
        self.run(&["cp", host_path, target.as_str()], None).await.map(|_| ())
    }

    /// Write bytes to a file inside a running container.
    ///
    /// Content goes over stdin (`sh -c "cat > path"`) so it never meets a
    /// shell quoting layer.
    pub async fn write_file(
        &self,
        name: &str,
        dest: &str,
        content: &[u8],
    ) -> Result<(), EngineError> {
        let script = format!("mkdir -p \"$(dirname '{}')\" && cat > '{}'", dest, dest);
        let mut child = Command::new(self.runtime.binary())
            .args(["exec", "-i", name, "sh", "-c", script.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content).await?;
            stdin.shutdown().await?;
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::CommandFailed {
                command: "exec".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    /// Restart a container (used by the monitor's liveness recovery).
    pub async fn restart(&self, name: &str) -> Result<(), EngineError> {
        self.run(&["restart", name], None).await.map(|_| ())
    }

    fn exec_args(
        &self,
        name: &str,
        command: &[&str],
        opts: &ExecOptions,
        interactive: bool,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec!["exec".into()];
        if interactive {
            args.push("-it".into());
        }
        if let Some(dir) = &opts.workdir {
            args.push("-w".into());
            args.push(dir.clone());
        }
        for (key, value) in &opts.env {
            args.push("-e".into());
            args.push(format!("{}={}", key, value));
        }
        args.push(name.to_string());
        args.extend(command.iter().map(|s| s.to_string()));
        args
    }
}

/// Parse `port` output (`0.0.0.0:32768`, `:::32768`, or `[::]:32768`).
fn parse_published_port(raw: &str) -> Option<u16> {
    raw.lines().find_map(|line| line.trim().rsplit(':').next().and_then(|p| p.parse::<u16>().ok()))
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
