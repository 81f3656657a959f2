// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity supervisor.
//!
//! Tracks whether the backend is reachable and how long to wait before the
//! next reachability probe:
//!
//! - Before the backend has ever answered, failures ramp linearly and fast
//!   (`initial + n * step`, capped at `initial_cap`).
//! - After first contact, failures back off exponentially
//!   (`base * 2^n`, capped at `max_interval`).
//! - Any success resets the interval to `base_interval`.
//!
//! `n` is the number of failures before the current one, so the first failure
//! always waits `initial` (or `base`). The supervisor does no I/O; the client
//! runs the probe and feeds the result back through [`report_outcome`].
//!
//! [`report_outcome`]: ConnectivitySupervisor::report_outcome

use std::time::Duration;

use crate::config::SupervisorConfig;

/// Reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub is_online: bool,
    pub consecutive_failures: u32,
    pub current_retry_interval: Duration,
    pub ever_connected_once: bool,
}

/// An online/offline flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Online,
    Offline,
}

/// Online/offline state machine with adaptive probe intervals.
#[derive(Debug)]
pub struct ConnectivitySupervisor {
    config: SupervisorConfig,
    state: ConnectionState,
    probe_pending: bool,
}

impl ConnectivitySupervisor {
    /// Creates a supervisor in the offline, never-connected state.
    pub fn new(config: SupervisorConfig) -> Self {
        let state = ConnectionState {
            is_online: false,
            consecutive_failures: 0,
            current_retry_interval: config.initial_interval(),
            ever_connected_once: false,
        };
        ConnectivitySupervisor {
            config,
            state,
            probe_pending: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online
    }

    /// Delay until the next scheduled probe.
    pub fn retry_interval(&self) -> Duration {
        self.state.current_retry_interval
    }

    pub fn probe_pending(&self) -> bool {
        self.probe_pending
    }

    /// Marks a probe as in flight.
    ///
    /// Returns false if one is already pending; the caller must not start another.
    pub fn begin_probe(&mut self) -> bool {
        if self.probe_pending {
            return false;
        }
        self.probe_pending = true;
        true
    }

    /// Records a probe result and returns the transition it caused, if any.
    ///
    /// Repeated failures while already offline update the interval but do not
    /// report another `Offline`.
    pub fn report_outcome(&mut self, success: bool) -> Option<Transition> {
        self.probe_pending = false;
        let was_online = self.state.is_online;

        if success {
            self.state.consecutive_failures = 0;
            self.state.ever_connected_once = true;
            self.state.current_retry_interval = self.config.base_interval();
            self.state.is_online = true;
            return (!was_online).then_some(Transition::Online);
        }

        let previous_failures = self.state.consecutive_failures;
        self.state.consecutive_failures = previous_failures.saturating_add(1);
        self.state.current_retry_interval = self.failure_interval(previous_failures);
        self.state.is_online = false;
        was_online.then_some(Transition::Offline)
    }

    fn failure_interval(&self, previous_failures: u32) -> Duration {
        if self.state.ever_connected_once {
            let factor = 1u32.checked_shl(previous_failures).unwrap_or(u32::MAX);
            self.config
                .base_interval()
                .saturating_mul(factor)
                .min(self.config.max_interval())
        } else {
            self.config
                .initial_interval()
                .saturating_add(self.config.step().saturating_mul(previous_failures))
                .min(self.config.initial_cap())
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
