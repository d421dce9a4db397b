// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main execution-service client implementation

use livy_api_contract::*;
use reqwest::{header, Client as HttpClient, Method, Response};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{AuthMode, AuthResolver};
use crate::error::{RestClientError, RestClientResult};

/// REST client for the Livy-compatible execution service
///
/// Every operation performs exactly one HTTP exchange: auth header resolved
/// per request, JSON body, and a cancellation signal observed while the
/// exchange is in flight. Nothing is retried here.
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthResolver,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(base_url: Url, auth: AuthMode) -> Self {
        let http_client = HttpClient::builder()
            .user_agent("livy-rest-client/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url,
            auth: AuthResolver::new(auth),
        }
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthMode) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::new(base_url, auth))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the auth resolver
    pub fn auth(&self) -> &AuthResolver {
        &self.auth
    }

    /// List all sessions
    pub async fn list_sessions(
        &self,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionListResponse> {
        self.get("/sessions", cancel).await
    }

    /// Create a session; the returned snapshot is typically still `starting`
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session> {
        self.post("/sessions", request, cancel).await
    }

    /// Fetch one session by id
    pub async fn get_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session> {
        let url = format!("/sessions/{}", session_id);
        self.get(&url, cancel).await
    }

    /// Delete a session
    pub async fn delete_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage> {
        let url = format!("/sessions/{}", session_id);
        self.delete(&url, cancel).await
    }

    /// Fetch a page of driver/session log lines
    pub async fn get_session_log(
        &self,
        session_id: i64,
        from: u32,
        size: u32,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionLogResponse> {
        let url = format!("/sessions/{}/log?from={}&size={}", session_id, from, size);
        self.get(&url, cancel).await
    }

    /// Submit one statement
    pub async fn create_statement(
        &self,
        session_id: i64,
        request: &CreateStatementRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement> {
        let url = format!("/sessions/{}/statements", session_id);
        self.post(&url, request, cancel).await
    }

    /// List statements of a session
    pub async fn list_statements(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<StatementListResponse> {
        let url = format!("/sessions/{}/statements", session_id);
        self.get(&url, cancel).await
    }

    /// Fetch one statement
    pub async fn get_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement> {
        let url = format!("/sessions/{}/statements/{}", session_id, statement_id);
        self.get(&url, cancel).await
    }

    /// Request cancellation of a statement; the server settles it to
    /// `cancelled` asynchronously
    pub async fn cancel_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage> {
        let url = format!("/sessions/{}/statements/{}/cancel", session_id, statement_id);
        self.post_empty(&url, cancel).await
    }

    // Private helper methods

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> RestClientResult<T> {
        self.request(Method::GET, path, None::<&()>, cancel).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> RestClientResult<T> {
        self.request(Method::POST, path, Some(body), cancel).await
    }

    async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> RestClientResult<T> {
        self.request(Method::POST, path, Some(&()), cancel).await
    }

    async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> RestClientResult<T> {
        self.request(Method::DELETE, path, None::<&()>, cancel).await
    }

    /// Perform one HTTP exchange: resolve auth, send, decode.
    async fn request<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> RestClientResult<T> {
        let url = join_path(&self.base_url, path)?;

        let mut request = self.http_client.request(method, url.clone());

        if let Some(value) = self.auth.authorization(&url).await? {
            request = request.header(header::AUTHORIZATION, value);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(RestClientError::Cancelled),
            result = request.send() => result?,
        };
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> RestClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(RestClientError::from)
        } else {
            Err(RestClientError::protocol(status, text))
        }
    }
}

/// Join a path (optionally carrying a query string) onto a base URL without
/// discarding any path segments the base already has.
pub(crate) fn join_path(base: &Url, path: &str) -> RestClientResult<Url> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Ok(Url::parse(&joined)?)
}
