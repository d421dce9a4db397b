// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Challenge negotiator for negotiated (SPNEGO) authentication
//!
//! The real negotiator binds a native Kerberos installation, which may be
//! absent; builds without the `kerberos` feature select a stub that fails
//! fast with an actionable message. Selection happens once in [`detect`],
//! not at every call site.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::AuthError;

/// One round of a stateful security-context negotiation
#[async_trait]
pub trait ChallengeNegotiator: Send + Sync + fmt::Debug {
    /// Produce a base64-encoded signed token for the given service principal.
    async fn negotiate(&self, service_principal: &str) -> Result<String, AuthError>;
}

/// Select the negotiator this build is capable of.
pub fn detect() -> Arc<dyn ChallengeNegotiator> {
    #[cfg(feature = "kerberos")]
    {
        Arc::new(kerberos::KerberosNegotiator)
    }
    #[cfg(not(feature = "kerberos"))]
    {
        Arc::new(UnavailableNegotiator)
    }
}

/// Fail-fast stand-in used when the native capability is not compiled in
#[derive(Debug)]
pub struct UnavailableNegotiator;

#[async_trait]
impl ChallengeNegotiator for UnavailableNegotiator {
    async fn negotiate(&self, _service_principal: &str) -> Result<String, AuthError> {
        Err(AuthError::NegotiateUnavailable)
    }
}

#[cfg(feature = "kerberos")]
mod kerberos {
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD as B64;
    use base64::Engine;
    use cross_krb5::{ClientCtx, InitiateFlags};

    use super::ChallengeNegotiator;
    use crate::error::AuthError;

    /// Negotiator backed by the platform Kerberos implementation
    ///
    /// Initiating the security context is a blocking library call, so it runs
    /// on the blocking pool. Only the initial token is needed: the HTTP
    /// exchange is a single-leg SPNEGO handshake.
    #[derive(Debug)]
    pub(super) struct KerberosNegotiator;

    #[async_trait]
    impl ChallengeNegotiator for KerberosNegotiator {
        async fn negotiate(&self, service_principal: &str) -> Result<String, AuthError> {
            let principal = service_principal.to_string();
            let spawn_principal = principal.clone();
            let token = tokio::task::spawn_blocking(move || {
                ClientCtx::new(InitiateFlags::empty(), None, &spawn_principal, None)
                    .map(|(_pending, token)| token.to_vec())
                    .map_err(|err| AuthError::NegotiationFailed {
                        principal: spawn_principal.clone(),
                        reason: err.to_string(),
                    })
            })
            .await
            .map_err(|err| AuthError::NegotiationFailed {
                principal,
                reason: format!("negotiation task failed: {}", err),
            })??;
            Ok(B64.encode(token))
        }
    }
}
