// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container creation spec and `run`-argument composition.
//!
//! The spec is assembled by the service manager (labels, env, mounts,
//! ports) and rendered here into a single `run -d ...` argument vector.
//! Rendering is pure so it can be tested without an engine.

use berth_core::ports::PortSpec;
use berth_core::profile::MountMode;

/// One bind mount, host side already resolved through symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    pub host: String,
    pub container: String,
    pub mode: MountMode,
}

impl Bind {
    pub fn new(host: impl Into<String>, container: impl Into<String>, mode: MountMode) -> Self {
        Self { host: host.into(), container: container.into(), mode }
    }

    fn render(&self) -> String {
        format!("{}:{}:{}", self.host, self.container, self.mode.as_flag())
    }
}

/// Everything needed to create one agent container.
#[derive(Debug, Clone, Default)]
pub struct CreateSpec {
    pub name: String,
    pub image: String,
    pub labels: Vec<(String, String)>,
    pub env: Vec<(String, String)>,
    pub binds: Vec<Bind>,
    pub ports: Vec<PortSpec>,
    /// Working directory inside the container.
    pub workdir: Option<String>,
    /// Optional command run via `sh -c` (keeps the container long-lived).
    pub command: Option<String>,
}

impl CreateSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self { name: name.into(), image: image.into(), ..Self::default() }
    }

    /// Render the full `create` argument vector for the engine CLI.
    ///
    /// Create is separate from start so the after-creation host hook can
    /// run in between. Containers are never auto-restarted by the engine;
    /// the container monitor owns restarts.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["create".into(), "--name".into(), self.name.clone()];

        for (key, value) in &self.labels {
            args.push("--label".into());
            args.push(format!("{}={}", key, value));
        }
        for (key, value) in &self.env {
            args.push("-e".into());
            args.push(format!("{}={}", key, value));
        }
        for bind in &self.binds {
            args.push("-v".into());
            args.push(bind.render());
        }
        for port in &self.ports {
            args.push("-p".into());
            args.push(render_publish(port));
        }
        if let Some(dir) = &self.workdir {
            args.push("-w".into());
            args.push(dir.clone());
        }
        args.push(self.image.clone());
        if let Some(cmd) = &self.command {
            args.push("sh".into());
            args.push("-c".into());
            args.push(cmd.clone());
        }
        args
    }
}

/// `-p` value for a port spec. A host port of 0 publishes the bare
/// container port, letting the engine choose a free host port.
fn render_publish(port: &PortSpec) -> String {
    match (port.host_ip, port.host_port) {
        (Some(ip), host) => format!("{}:{}:{}", ip, host, port.container_port),
        (None, 0) => format!("{}", port.container_port),
        (None, host) => format!("{}:{}", host, port.container_port),
    }
}

#[cfg(test)]
#[path = "create_tests.rs"]
mod tests;
