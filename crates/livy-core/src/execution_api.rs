// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client abstraction used by the lifecycle manager
//!
//! This trait defines the subset of execution-service operations the
//! lifecycle manager needs. It lives here rather than in `livy-rest-client`
//! because it states core's interface requirements, not the client's
//! capabilities, and it lets the manager run against a scripted mock in
//! tests. Since this crate depends on `livy-rest-client`, the trait is
//! implemented directly for `RestClient` below; no wrapper type is needed.

use async_trait::async_trait;
use livy_api_contract::*;
use livy_rest_client::{RestClient, RestClientResult};
use tokio_util::sync::CancellationToken;

/// Execution-service operations the lifecycle manager is built on
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    async fn list_sessions(
        &self,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionListResponse>;

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session>;

    async fn get_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session>;

    async fn delete_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage>;

    async fn get_session_log(
        &self,
        session_id: i64,
        from: u32,
        size: u32,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionLogResponse>;

    async fn create_statement(
        &self,
        session_id: i64,
        request: &CreateStatementRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement>;

    async fn get_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement>;

    async fn cancel_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage>;
}

#[async_trait]
impl ExecutionApi for RestClient {
    async fn list_sessions(
        &self,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionListResponse> {
        RestClient::list_sessions(self, cancel).await
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session> {
        RestClient::create_session(self, request, cancel).await
    }

    async fn get_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Session> {
        RestClient::get_session(self, session_id, cancel).await
    }

    async fn delete_session(
        &self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage> {
        RestClient::delete_session(self, session_id, cancel).await
    }

    async fn get_session_log(
        &self,
        session_id: i64,
        from: u32,
        size: u32,
        cancel: &CancellationToken,
    ) -> RestClientResult<SessionLogResponse> {
        RestClient::get_session_log(self, session_id, from, size, cancel).await
    }

    async fn create_statement(
        &self,
        session_id: i64,
        request: &CreateStatementRequest,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement> {
        RestClient::create_statement(self, session_id, request, cancel).await
    }

    async fn get_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<Statement> {
        RestClient::get_statement(self, session_id, statement_id, cancel).await
    }

    async fn cancel_statement(
        &self,
        session_id: i64,
        statement_id: i64,
        cancel: &CancellationToken,
    ) -> RestClientResult<ServiceMessage> {
        RestClient::cancel_statement(self, session_id, statement_id, cancel).await
    }
}
