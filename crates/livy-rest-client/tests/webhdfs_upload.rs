// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests for the two-step redirect upload protocol against an
//! in-process mock storage service.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::put,
    Json, Router,
};
use livy_rest_client::{AuthMode, RestClientError, StorageClient};
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MockStorage {
    addr: Option<SocketAddr>,
    mkdirs_calls: Vec<String>,
    uploads: HashMap<String, Vec<u8>>,
    create_authorization: Option<String>,
    data_authorization: Option<String>,
    data_hits: u32,
}

type Shared = Arc<Mutex<MockStorage>>;

async fn namenode(
    State(state): State<Shared>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    let query = query.unwrap_or_default();
    let mut storage = state.lock().unwrap();

    if query.contains("op=MKDIRS") {
        storage.mkdirs_calls.push(format!("/{}", path));
        return Json(json!({"boolean": true})).into_response();
    }

    if query.contains("op=CREATE") {
        storage.create_authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if path.ends_with("denied.bin") {
            return (StatusCode::FORBIDDEN, "Permission denied").into_response();
        }
        if path.ends_with("noloc.bin") {
            // Protocol violation: redirect without a Location header.
            return StatusCode::TEMPORARY_REDIRECT.into_response();
        }
        let location = format!("http://{}/data/{}", storage.addr.unwrap(), path);
        return (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, location)],
        )
            .into_response();
    }

    if query.contains("op=DELETE") {
        let key = format!("/{}", path);
        if storage.uploads.remove(&key).is_some() {
            return Json(json!({"boolean": true})).into_response();
        }
        return (StatusCode::NOT_FOUND, "File does not exist").into_response();
    }

    (StatusCode::BAD_REQUEST, "Unsupported operation").into_response()
}

async fn datanode(
    State(state): State<Shared>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mut storage = state.lock().unwrap();
    storage.data_hits += 1;
    storage.data_authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/octet-stream")
    );
    storage.uploads.insert(format!("/{}", path), body.to_vec());
    StatusCode::CREATED
}

async fn spawn_mock() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockStorage::default()));
    let app = Router::new()
        .route("/webhdfs/v1/*path", put(namenode).delete(namenode))
        .route("/data/*path", put(datanode))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    state.lock().unwrap().addr = Some(addr);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn storage_for(addr: SocketAddr, auth: AuthMode) -> StorageClient {
    StorageClient::from_url(&format!("http://{}/webhdfs/v1", addr), auth).unwrap()
}

fn write_fixture(content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn upload_streams_bytes_through_the_redirect() {
    let (addr, state) = spawn_mock().await;
    let storage = storage_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();
    let fixture = write_fixture(b"jar bytes go here");

    let locator = storage
        .upload(fixture.path(), "helpers.jar", "alice", &cancel)
        .await
        .unwrap();

    assert_eq!(locator, "hdfs:///user/alice/upload/helpers.jar");

    let storage_state = state.lock().unwrap();
    assert_eq!(storage_state.mkdirs_calls, vec!["/user/alice/upload".to_string()]);
    assert_eq!(storage_state.data_hits, 1);
    assert_eq!(
        storage_state.uploads.get("/user/alice/upload/helpers.jar"),
        Some(&b"jar bytes go here".to_vec())
    );
}

#[tokio::test]
async fn missing_location_header_is_a_protocol_violation() {
    let (addr, state) = spawn_mock().await;
    let storage = storage_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();
    let fixture = write_fixture(b"irrelevant");

    let err = storage
        .upload(fixture.path(), "noloc.bin", "alice", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, RestClientError::MissingRedirectLocation));
    // No partial upload may be recorded.
    assert!(state.lock().unwrap().uploads.is_empty());
}

#[tokio::test]
async fn non_redirect_create_status_is_a_hard_failure() {
    let (addr, _state) = spawn_mock().await;
    let storage = storage_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();
    let fixture = write_fixture(b"irrelevant");

    let err = storage
        .upload(fixture.path(), "denied.bin", "alice", &cancel)
        .await
        .unwrap_err();

    match err {
        RestClientError::Protocol { status, body } => {
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(body.contains("Permission denied"));
        }
        other => panic!("expected protocol error, got {other}"),
    }
}

#[tokio::test]
async fn second_delete_of_a_locator_fails_not_found() {
    let (addr, _state) = spawn_mock().await;
    let storage = storage_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();
    let fixture = write_fixture(b"bytes");

    let locator = storage
        .upload(fixture.path(), "once.jar", "alice", &cancel)
        .await
        .unwrap();

    storage.delete(&locator, &cancel).await.unwrap();
    let err = storage.delete(&locator, &cancel).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404 protocol error, got {err}");
}

#[tokio::test]
async fn auth_header_is_resolved_for_each_hop() {
    let (addr, state) = spawn_mock().await;
    let storage = storage_for(
        addr,
        AuthMode::Basic {
            username: "alice".to_string(),
            password: "pw".to_string(),
        },
    );
    let cancel = CancellationToken::new();
    let fixture = write_fixture(b"bytes");

    storage
        .upload(fixture.path(), "hops.jar", "alice", &cancel)
        .await
        .unwrap();

    let storage_state = state.lock().unwrap();
    let create_auth = storage_state.create_authorization.clone().unwrap();
    let data_auth = storage_state.data_authorization.clone().unwrap();
    assert!(create_auth.starts_with("Basic "));
    assert_eq!(create_auth, data_auth);
}
