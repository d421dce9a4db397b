// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests for the execution-service client against an in-process
//! mock service bound to an ephemeral port.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use livy_api_contract::{CreateSessionRequest, CreateStatementRequest, SessionKind, SessionState, StatementState};
use livy_rest_client::{AuthMode, RestClient, RestClientError};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MockLivy {
    next_id: i64,
    fetches: HashMap<i64, u32>,
    deleted: HashSet<i64>,
    authorization_seen: Vec<Option<String>>,
}

type Shared = Arc<Mutex<MockLivy>>;

fn session_json(id: i64, state: &str) -> Value {
    json!({
        "id": id,
        "name": "mock",
        "owner": "alice",
        "kind": "spark",
        "state": state,
        "jars": ["wasb:///libs/util.jar"],
        "conf": {},
        "log": []
    })
}

async fn create_session(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Json<Value> {
    let mut livy = state.lock().unwrap();
    livy.next_id += 1;
    let id = livy.next_id;
    livy.fetches.insert(id, 0);
    livy.authorization_seen.push(
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    Json(session_json(id, "starting"))
}

async fn get_session(State(state): State<Shared>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut livy = state.lock().unwrap();
    if livy.deleted.contains(&id) {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    }
    let fetches = livy.fetches.entry(id).or_insert(0);
    *fetches += 1;
    let state_name = if *fetches >= 3 { "idle" } else { "starting" };
    Json(session_json(id, state_name)).into_response()
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut livy = state.lock().unwrap();
    if livy.deleted.insert(id) {
        Json(json!({"msg": "deleted"})).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Session not found").into_response()
    }
}

async fn get_log(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "from": 0,
        "size": 2,
        "total": 2,
        "log": ["stdout: ready", "stderr: nothing"]
    }))
}

async fn create_statement(
    Path(_id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(json!({
        "id": 0,
        "code": body["code"],
        "state": "waiting",
        "output": null,
        "progress": 0.0
    }))
}

async fn get_statement(Path((_id, sid)): Path<(i64, i64)>) -> Json<Value> {
    Json(json!({
        "id": sid,
        "code": "1 + 1",
        "state": "available",
        "progress": 1.0,
        "output": {
            "status": "ok",
            "execution_count": 1,
            "data": {"text/plain": "res0: Int = 2"}
        }
    }))
}

async fn list_statements(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({
        "total_statements": 1,
        "statements": [{
            "id": 0,
            "code": "1 + 1",
            "state": "available",
            "progress": 1.0,
            "output": null
        }]
    }))
}

async fn cancel_statement(Path((_id, _sid)): Path<(i64, i64)>) -> Json<Value> {
    Json(json!({"msg": "canceled"}))
}

async fn spawn_mock() -> (SocketAddr, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockLivy::default()));
    let app = Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/log", get(get_log))
        .route("/sessions/:id/statements", post(create_statement).get(list_statements))
        .route("/sessions/:id/statements/:sid", get(get_statement))
        .route("/sessions/:id/statements/:sid/cancel", post(cancel_statement))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

fn client_for(addr: SocketAddr, auth: AuthMode) -> RestClient {
    RestClient::from_url(&format!("http://{}", addr), auth).unwrap()
}

#[tokio::test]
async fn session_round_trip_reaches_idle() {
    let (addr, _state) = spawn_mock().await;
    let client = client_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();

    let request = CreateSessionRequest {
        kind: SessionKind::Spark,
        ..Default::default()
    };
    let session = client.create_session(&request, &cancel).await.unwrap();
    assert_eq!(session.state, SessionState::Starting);

    let mut latest = session;
    for _ in 0..5 {
        latest = client.get_session(latest.id, &cancel).await.unwrap();
        if latest.state == SessionState::Idle {
            break;
        }
    }
    assert_eq!(latest.state, SessionState::Idle);
    assert_eq!(latest.jars, vec!["wasb:///libs/util.jar".to_string()]);
}

#[tokio::test]
async fn statement_submission_and_fetch_decode() {
    let (addr, _state) = spawn_mock().await;
    let client = client_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();

    let request = CreateStatementRequest {
        code: "1 + 1".to_string(),
        kind: None,
    };
    let statement = client.create_statement(4, &request, &cancel).await.unwrap();
    assert_eq!(statement.state, StatementState::Waiting);
    assert!(statement.output.is_none());

    let statement = client.get_statement(4, statement.id, &cancel).await.unwrap();
    assert_eq!(statement.state, StatementState::Available);
    let rendered = statement.output.unwrap().render().unwrap();
    assert_eq!(rendered, "res0: Int = 2");

    let message = client.cancel_statement(4, 0, &cancel).await.unwrap();
    assert_eq!(message.msg, "canceled");

    let listing = client.list_statements(4, &cancel).await.unwrap();
    assert_eq!(listing.total_statements, 1);
    assert_eq!(listing.statements[0].state, StatementState::Available);
}

#[tokio::test]
async fn delete_is_a_hard_failure_the_second_time() {
    let (addr, _state) = spawn_mock().await;
    let client = client_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();

    let request = CreateSessionRequest::default();
    let session = client.create_session(&request, &cancel).await.unwrap();

    client.delete_session(session.id, &cancel).await.unwrap();
    let err = client.delete_session(session.id, &cancel).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404 protocol error, got {err}");
}

#[tokio::test]
async fn log_fetch_decodes_pagination_fields() {
    let (addr, _state) = spawn_mock().await;
    let client = client_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();

    let page = client.get_session_log(7, 0, 10, &cancel).await.unwrap();
    assert_eq!(page.id, 7);
    assert_eq!(page.total, Some(2));
    assert_eq!(page.log.len(), 2);
}

#[tokio::test]
async fn basic_auth_header_reaches_the_service() {
    let (addr, state) = spawn_mock().await;
    let client = client_for(
        addr,
        AuthMode::Basic {
            username: "alice".to_string(),
            password: "pw".to_string(),
        },
    );
    let cancel = CancellationToken::new();

    client
        .create_session(&CreateSessionRequest::default(), &cancel)
        .await
        .unwrap();

    let seen = state.lock().unwrap().authorization_seen.clone();
    assert_eq!(seen.len(), 1);
    let header = seen[0].clone().expect("authorization header missing");
    assert!(header.starts_with("Basic "), "unexpected header {header}");
}

#[tokio::test]
async fn fired_cancellation_aborts_an_in_flight_exchange() {
    let (addr, _state) = spawn_mock().await;
    let client = client_for(addr, AuthMode::None);
    let cancel = CancellationToken::new();
    cancel.cancel();

    // A network exchange can never complete on its first poll, so the fired
    // token wins the race regardless of how fast the service answers.
    let err = client.list_sessions(&cancel).await.unwrap_err();
    assert!(matches!(err, RestClientError::Cancelled));
}
