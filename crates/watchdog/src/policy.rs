// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart policy: a pure state machine, no IO.
//!
//! The supervisor feeds it child exits, health-check results, and stable
//! runtimes; it answers with restart/stop/trip decisions. Keeping it pure
//! makes the circuit-breaker and backoff arithmetic testable without a
//! child process.

use std::collections::VecDeque;
use std::time::Duration;

/// Initial restart backoff.
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
/// Backoff ceiling.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
/// Backoff multiplier.
pub const BACKOFF_MULT: u32 = 2;
/// Circuit-breaker window.
pub const RESTART_WINDOW: Duration = Duration::from_secs(60);
/// Restarts tolerated inside the window before tripping.
pub const RESTART_LIMIT: usize = 5;
/// Consecutive health failures before a forced restart.
pub const HEALTH_LIMIT: u32 = 3;
/// Continuous runtime after which backoff and counters reset.
pub const STABLE_RUNTIME: Duration = Duration::from_secs(60);

/// How a child exit was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub code: Option<i32>,
    /// Terminated by SIGTERM or SIGINT.
    pub intentional_signal: bool,
}

/// Supervisor decision for one child exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Restart after the given backoff delay.
    Restart { delay: Duration },
    /// Do not restart; exit the supervisor with this code.
    Stop { exit_code: i32 },
    /// Circuit breaker tripped; exit with code 100.
    Trip,
}

/// Watchdog supervision state, advanced by events.
#[derive(Debug)]
pub struct RestartPolicy {
    backoff: Duration,
    restarts: VecDeque<u64>,
    consecutive_failures: u32,
    health_fails: u32,
    pending_health_restart: bool,
    tripped: bool,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RestartPolicy {
    pub fn new() -> Self {
        Self {
            backoff: INITIAL_BACKOFF,
            restarts: VecDeque::new(),
            consecutive_failures: 0,
            health_fails: 0,
            pending_health_restart: false,
            tripped: false,
        }
    }

    pub fn tripped(&self) -> bool {
        self.tripped
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Restarts currently inside the breaker window.
    pub fn restarts_in_window(&self, now_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(RESTART_WINDOW.as_millis() as u64);
        self.restarts.iter().filter(|&&t| t > cutoff).count()
    }

    /// Decide what to do about a child exit at `now_ms`.
    pub fn on_exit(&mut self, exit: ChildExit, now_ms: u64) -> Decision {
        if self.tripped {
            return Decision::Trip;
        }

        // A health-check restart was requested; the exit is ours.
        if self.pending_health_restart {
            self.pending_health_restart = false;
            self.health_fails = 0;
            return self.schedule_restart(now_ms);
        }

        match exit.code {
            Some(0) => return Decision::Stop { exit_code: 0 },
            // Port conflict / permission problem: restarting cannot help.
            Some(2) => return Decision::Stop { exit_code: 2 },
            Some(code) if code >= 100 => return Decision::Stop { exit_code: code },
            _ => {}
        }
        if exit.intentional_signal {
            return Decision::Stop { exit_code: 0 };
        }

        self.consecutive_failures += 1;
        self.schedule_restart(now_ms)
    }

    fn schedule_restart(&mut self, now_ms: u64) -> Decision {
        // Prune restarts that fell out of the window, then check the breaker.
        let cutoff = now_ms.saturating_sub(RESTART_WINDOW.as_millis() as u64);
        while self.restarts.front().is_some_and(|&t| t <= cutoff) {
            self.restarts.pop_front();
        }
        if self.restarts.len() >= RESTART_LIMIT {
            self.tripped = true;
            return Decision::Trip;
        }
        self.restarts.push_back(now_ms);

        let delay = self.backoff;
        self.backoff = (self.backoff * BACKOFF_MULT).min(MAX_BACKOFF);
        Decision::Restart { delay }
    }

    /// The child ran continuously for `runtime`; reset on stability.
    pub fn on_runtime(&mut self, runtime: Duration) {
        if runtime > STABLE_RUNTIME {
            self.backoff = INITIAL_BACKOFF;
            self.consecutive_failures = 0;
        }
    }

    /// Record one health-check result. Returns `true` when the failure
    /// threshold is crossed and the supervisor should terminate the child
    /// (the subsequent exit restarts it).
    pub fn on_health(&mut self, healthy: bool) -> bool {
        if healthy {
            self.health_fails = 0;
            return false;
        }
        self.health_fails += 1;
        if self.health_fails >= HEALTH_LIMIT && !self.pending_health_restart {
            self.pending_health_restart = true;
            return true;
        }
        false
    }

    pub fn health_restart_pending(&self) -> bool {
        self.pending_health_restart
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
