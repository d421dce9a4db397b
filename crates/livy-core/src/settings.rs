// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Lifecycle manager tuning knobs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the lifecycle manager
///
/// Deserializable so an embedding configuration layer can populate it; every
/// field has a sensible default. Statement execution intentionally has no
/// timeout knob: it runs until a terminal state or explicit cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Delay between state re-fetches in a poll loop.
    pub poll_interval: Duration,
    /// Wall-clock deadline for a session to become idle after creation.
    pub creation_timeout: Duration,
    /// Issue a best-effort delete for the half-started session when a
    /// creation poll is cancelled. Off by default: the remote session may
    /// still come up and be reconnected to.
    pub kill_on_cancel: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            creation_timeout: Duration::from_secs(180),
            kill_on_cancel: false,
        }
    }
}
