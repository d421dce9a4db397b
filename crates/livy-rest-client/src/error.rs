// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the REST client

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for REST client operations
pub type RestClientResult<T> = Result<T, RestClientError>;

/// Errors surfaced by the transport, the typed operations and the storage client
///
/// None of these are retried automatically. `Cancelled` is produced when a
/// cancellation signal fires while an exchange is in flight; callers that
/// model cancellation as a distinct outcome match on it rather than
/// propagating it as a failure.
#[derive(Debug, Error)]
pub enum RestClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Protocol { status: StatusCode, body: String },

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Redirect response did not carry a Location header")]
    MissingRedirectLocation,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RestClientError {
    /// Protocol error carrying the response status and raw body.
    pub(crate) fn protocol(status: StatusCode, body: String) -> Self {
        RestClientError::Protocol { status, body }
    }

    /// True when the service answered 404 for the addressed resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RestClientError::Protocol {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}

/// Authentication failures, split by what the operator has to fix
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "Negotiate authentication is not available in this build; \
         reinstall with the `kerberos` feature enabled"
    )]
    NegotiateUnavailable,

    #[error(
        "Security context negotiation for {principal} failed: {reason}. \
         Check that a valid ticket cache exists (kinit) and has not expired"
    )]
    NegotiationFailed { principal: String, reason: String },

    #[error("Cannot derive a service principal from {url}: the URL has no host")]
    PrincipalUnderivable { url: String },
}
