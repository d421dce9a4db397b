// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for API contract validation and parsing

use thiserror::Error;

/// Errors that can occur during API contract validation and parsing
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid session kind: {0}")]
    InvalidSessionKind(String),

    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("Invalid statement state: {0}")]
    InvalidStatementState(String),
}
