// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-engine: uniform wrapper over the container engine CLI.
//!
//! One [`Engine`] value abstracts both supported runtimes (docker and
//! podman) behind identical semantics: create, start, stop, remove,
//! inspect, ps, exec, cp. Every operation shells out to the engine binary
//! via `tokio::process` and maps CLI failures onto typed errors.

mod create;
mod error;
mod exec;
mod ops;
mod runtime;

pub use create::{Bind, CreateSpec};
pub use error::EngineError;
pub use exec::{ExecOptions, ExecOutput, ExecStream};
pub use ops::{ContainerState, Engine};
pub use runtime::ContainerRuntime;
