// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authentication configuration and per-request header resolution

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

use crate::error::AuthError;
use crate::negotiate::{self, ChallengeNegotiator};

/// Authentication modes, configuration-selected and mutually exclusive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    /// Negotiated challenge/response auth. When `principal` is not configured
    /// it defaults to `HTTP/<host>` derived from the request target.
    Negotiate {
        #[serde(skip_serializing_if = "Option::is_none")]
        principal: Option<String>,
    },
}

/// Resolves the `Authorization` header for one request
///
/// The negotiator is selected once at construction from what this build can
/// do, not probed per call. Resolution is per-request because the negotiate
/// mode derives its service principal from the target host, which differs
/// between the execution service and the storage redirect target.
#[derive(Debug, Clone)]
pub struct AuthResolver {
    mode: AuthMode,
    negotiator: Arc<dyn ChallengeNegotiator>,
}

impl AuthResolver {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            negotiator: negotiate::detect(),
        }
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    /// Produce the `Authorization` header value for a request against
    /// `target`, or `None` when the configured mode sends no header.
    pub async fn authorization(&self, target: &Url) -> Result<Option<String>, AuthError> {
        match &self.mode {
            AuthMode::None => Ok(None),
            AuthMode::Basic { username, password } => {
                let credentials = B64.encode(format!("{}:{}", username, password));
                Ok(Some(format!("Basic {}", credentials)))
            }
            AuthMode::Bearer { token } => Ok(Some(format!("Bearer {}", token))),
            AuthMode::Negotiate { principal } => {
                let principal = match principal {
                    Some(explicit) => explicit.clone(),
                    None => default_service_principal(target)?,
                };
                let token = self.negotiator.negotiate(&principal).await?;
                Ok(Some(format!("Negotiate {}", token)))
            }
        }
    }
}

/// Well-known service principal for an HTTP endpoint: `HTTP/<host>`.
pub fn default_service_principal(target: &Url) -> Result<String, AuthError> {
    let host = target.host_str().ok_or_else(|| AuthError::PrincipalUnderivable {
        url: target.to_string(),
    })?;
    Ok(format!("HTTP/{}", host))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://livy.example.net:8998/sessions").unwrap()
    }

    #[tokio::test]
    async fn none_mode_sends_no_header() {
        let resolver = AuthResolver::new(AuthMode::None);
        assert_eq!(resolver.authorization(&target()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn basic_mode_encodes_credentials() {
        let resolver = AuthResolver::new(AuthMode::Basic {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        });
        let header = resolver.authorization(&target()).await.unwrap().unwrap();
        assert_eq!(header, format!("Basic {}", B64.encode("alice:s3cret")));
    }

    #[tokio::test]
    async fn bearer_mode_passes_token_through() {
        let resolver = AuthResolver::new(AuthMode::Bearer {
            token: "opaque-token".to_string(),
        });
        let header = resolver.authorization(&target()).await.unwrap().unwrap();
        assert_eq!(header, "Bearer opaque-token");
    }

    #[test]
    fn default_principal_derives_from_host() {
        assert_eq!(
            default_service_principal(&target()).unwrap(),
            "HTTP/livy.example.net"
        );
    }

    #[cfg(not(feature = "kerberos"))]
    #[tokio::test]
    async fn negotiate_mode_fails_fast_without_kerberos_build() {
        let resolver = AuthResolver::new(AuthMode::Negotiate { principal: None });
        let err = resolver.authorization(&target()).await.unwrap_err();
        assert!(matches!(err, AuthError::NegotiateUnavailable));
    }

    #[test]
    fn auth_mode_deserializes_from_tagged_config() {
        let mode: AuthMode =
            serde_json::from_str(r#"{"mode": "basic", "username": "u", "password": "p"}"#).unwrap();
        assert_eq!(
            mode,
            AuthMode::Basic {
                username: "u".to_string(),
                password: "p".to_string()
            }
        );

        let mode: AuthMode = serde_json::from_str(r#"{"mode": "none"}"#).unwrap();
        assert_eq!(mode, AuthMode::None);
    }
}
