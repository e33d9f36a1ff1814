// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port specification grammar.
//!
//! Accepted colon-separated forms:
//!
//! - `PORT` — container port, random host port
//! - `HOST:CONTAINER` — explicit host port
//! - `IP:HOST:CONTAINER` — bind to a specific address
//!
//! Whitespace is prohibited; ports are 1..=65535. A host port of 0 means
//! "allocate a random host port at container creation".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// A single parsed port mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Bind address, when the three-part form was used.
    pub host_ip: Option<IpAddr>,
    /// Host port; 0 means random allocation at create time.
    pub host_port: u16,
    /// Container port.
    pub container_port: u16,
}

impl PortSpec {
    /// Mapping with a random host port.
    pub fn random_host(container_port: u16) -> Self {
        Self { host_ip: None, host_port: 0, container_port }
    }

    /// Explicit host-to-container mapping.
    pub fn fixed(host_port: u16, container_port: u16) -> Self {
        Self { host_ip: None, host_port, container_port }
    }
}

/// Errors from parsing a port spec string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortParseError {
    #[error("empty port spec")]
    Empty,
    #[error("whitespace not allowed in port spec '{0}'")]
    Whitespace(String),
    #[error("invalid port '{0}': must be 1-65535")]
    InvalidPort(String),
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),
    #[error("too many ':' segments in port spec '{0}'")]
    TooManySegments(String),
}

fn parse_port(s: &str) -> Result<u16, PortParseError> {
    match s.parse::<u32>() {
        Ok(n) if (1..=65535).contains(&n) => Ok(n as u16),
        _ => Err(PortParseError::InvalidPort(s.to_string())),
    }
}

impl FromStr for PortSpec {
    type Err = PortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PortParseError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(PortParseError::Whitespace(s.to_string()));
        }
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [container] => Ok(PortSpec::random_host(parse_port(container)?)),
            [host, container] => Ok(PortSpec::fixed(parse_port(host)?, parse_port(container)?)),
            [ip, host, container] => {
                let addr: IpAddr = ip
                    .parse()
                    .map_err(|_| PortParseError::InvalidAddress(ip.to_string()))?;
                Ok(PortSpec {
                    host_ip: Some(addr),
                    host_port: parse_port(host)?,
                    container_port: parse_port(container)?,
                })
            }
            _ => Err(PortParseError::TooManySegments(s.to_string())),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.host_ip, self.host_port) {
            (Some(ip), host) => write!(f, "{}:{}:{}", ip, host, self.container_port),
            (None, 0) => write!(f, "{}", self.container_port),
            (None, host) => write!(f, "{}:{}", host, self.container_port),
        }
    }
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
