// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Lifecycle notifications
//!
//! Emitted on a broadcast channel after the triggering transition has been
//! recorded in the in-memory model; any task awaiting a notification blocks
//! on its receiver rather than on a callback registration.

use livy_api_contract::{Session, Statement};

/// Notifications emitted by the lifecycle manager
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// The active-session handle changed: installed on create/connect/restore,
    /// cleared (`None`) on kill.
    SessionChanged(Option<Session>),
    /// A statement reached a terminal state.
    StatementCompleted {
        session_id: i64,
        statement: Statement,
    },
}
