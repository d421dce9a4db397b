// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for lifecycle operations

use livy_api_contract::SessionState;
use livy_rest_client::RestClientError;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by lifecycle operations
///
/// Cancellation is deliberately absent: operations that observe a fired
/// cancellation signal resolve to an `Aborted` outcome, never to an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] RestClientError),

    #[error("No active session; create or connect one first")]
    NoActiveSession,

    #[error("Active session {id} is {state} and cannot accept statements")]
    SessionNotUsable { id: i64, state: SessionState },

    #[error("Session {id} failed to start: reached state {state}")]
    StartupFailed { id: i64, state: SessionState },

    #[error("Session {id} did not become idle within {timeout:?}")]
    StartupTimeout { id: i64, timeout: Duration },
}
