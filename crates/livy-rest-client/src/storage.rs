// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Storage client implementing the two-step redirect upload protocol
//!
//! The create request goes to the primary endpoint and answers with a 307
//! whose `Location` names the node that actually receives bytes. The two
//! targets can live on different hosts, so the auth header is resolved
//! independently for every hop.

use reqwest::{header, Body, Client as HttpClient, RequestBuilder, Response, StatusCode};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::auth::{AuthMode, AuthResolver};
use crate::client::join_path;
use crate::error::{RestClientError, RestClientResult};

/// Directory under the owner's home that uploads land in
const UPLOAD_DIR: &str = "upload";

/// Client for the WebHDFS-compatible storage side-channel
#[derive(Debug, Clone)]
pub struct StorageClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthResolver,
}

impl StorageClient {
    /// Create a new storage client
    ///
    /// Automatic redirect following is disabled so the 307 hop of the upload
    /// protocol is observed explicitly and re-authenticated per target.
    pub fn new(base_url: Url, auth: AuthMode) -> Self {
        let http_client = HttpClient::builder()
            .user_agent("livy-rest-client/0.1")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url,
            auth: AuthResolver::new(auth),
        }
    }

    /// Create a storage client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthMode) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::new(base_url, auth))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upload a local file into the owner's upload directory.
    ///
    /// Returns the canonical locator of the uploaded resource. The file is
    /// streamed to the redirect target, never buffered whole in memory.
    pub async fn upload(
        &self,
        local_path: &Path,
        remote_name: &str,
        owner: &str,
        cancel: &CancellationToken,
    ) -> RestClientResult<String> {
        let dir = format!("/user/{}/{}", owner, UPLOAD_DIR);
        self.mkdirs(&dir, cancel).await?;

        let remote_path = format!("{}/{}", dir, remote_name);
        let create_url = self.operation_url(&remote_path, "op=CREATE&overwrite=true")?;

        let response = self.send(self.http_client.put(create_url.clone()), &create_url, cancel).await?;
        let status = response.status();
        if status != StatusCode::TEMPORARY_REDIRECT {
            let body = response.text().await.unwrap_or_default();
            return Err(RestClientError::protocol(status, body));
        }
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(RestClientError::MissingRedirectLocation)?;
        let target = Url::parse(location)?;
        debug!(%target, "storage create redirected");

        let file = tokio::fs::File::open(local_path).await?;
        let request = self
            .http_client
            .put(target.clone())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::wrap_stream(ReaderStream::new(file)));
        let response = self.send(request, &target, cancel).await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(RestClientError::protocol(status, body));
        }

        Ok(format!("hdfs://{}", remote_path))
    }

    /// Delete a stored resource addressed by its locator.
    ///
    /// Accepts locators with or without a scheme prefix; any non-2xx answer,
    /// including 404 for an already-deleted resource, is a hard failure.
    pub async fn delete(&self, locator: &str, cancel: &CancellationToken) -> RestClientResult<()> {
        let path = strip_scheme(locator);
        let url = self.operation_url(path, "op=DELETE")?;

        let response = self.send(self.http_client.delete(url.clone()), &url, cancel).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestClientError::protocol(status, body));
        }
        Ok(())
    }

    /// Idempotent directory creation; "already exists" and "created" are
    /// indistinguishable on the wire and both succeed.
    async fn mkdirs(&self, path: &str, cancel: &CancellationToken) -> RestClientResult<()> {
        let url = self.operation_url(path, "op=MKDIRS")?;
        let response = self.send(self.http_client.put(url.clone()), &url, cancel).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestClientError::protocol(status, body));
        }
        Ok(())
    }

    fn operation_url(&self, path: &str, query: &str) -> RestClientResult<Url> {
        let mut url = join_path(&self.base_url, path)?;
        url.set_query(Some(query));
        Ok(url)
    }

    /// Resolve the auth header for this hop's target and send.
    async fn send(
        &self,
        mut request: RequestBuilder,
        target: &Url,
        cancel: &CancellationToken,
    ) -> RestClientResult<Response> {
        if let Some(value) = self.auth.authorization(target).await? {
            request = request.header(header::AUTHORIZATION, value);
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(RestClientError::Cancelled),
            result = request.send() => Ok(result?),
        }
    }
}

/// Strip a `scheme://` prefix off a locator, leaving the absolute path.
fn strip_scheme(locator: &str) -> &str {
    match locator.find("://") {
        Some(idx) => &locator[idx + 3..],
        None => locator,
    }
}
