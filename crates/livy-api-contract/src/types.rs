//! API contract types for the Livy-compatible execution service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::ApiContractError;

/// Execution language of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Spark,
    PySpark,
    SparkR,
    Sql,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Spark => write!(f, "spark"),
            SessionKind::PySpark => write!(f, "pyspark"),
            SessionKind::SparkR => write!(f, "sparkr"),
            SessionKind::Sql => write!(f, "sql"),
        }
    }
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Spark
    }
}

impl FromStr for SessionKind {
    type Err = ApiContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spark" | "scala" => Ok(SessionKind::Spark),
            "pyspark" | "python" => Ok(SessionKind::PySpark),
            "sparkr" | "r" => Ok(SessionKind::SparkR),
            "sql" => Ok(SessionKind::Sql),
            other => Err(ApiContractError::InvalidSessionKind(other.to_string())),
        }
    }
}

/// Session lifecycle states as reported by the service
///
/// `recovering` is not part of the nominal lifecycle but can appear on the
/// wire when the service restarts; it is non-terminal and non-usable, so a
/// creation poll rides through it like `starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Starting,
    Recovering,
    Idle,
    Busy,
    ShuttingDown,
    Error,
    Dead,
    Killed,
    Success,
}

impl SessionState {
    /// Terminal states require a fresh create/connect; no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Error | SessionState::Dead | SessionState::Killed | SessionState::Success
        )
    }

    /// Only `idle` and `busy` sessions accept statement submissions.
    pub fn is_usable(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Busy)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::NotStarted => "not_started",
            SessionState::Starting => "starting",
            SessionState::Recovering => "recovering",
            SessionState::Idle => "idle",
            SessionState::Busy => "busy",
            SessionState::ShuttingDown => "shutting_down",
            SessionState::Error => "error",
            SessionState::Dead => "dead",
            SessionState::Killed => "killed",
            SessionState::Success => "success",
        };
        write!(f, "{}", s)
    }
}

/// Statement lifecycle states
///
/// `cancelling` is transient: the service reports it while a cancel request is
/// in flight, before settling on `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementState {
    Waiting,
    Running,
    Cancelling,
    Cancelled,
    Available,
    Error,
}

impl StatementState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StatementState::Available | StatementState::Error | StatementState::Cancelled
        )
    }
}

impl fmt::Display for StatementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementState::Waiting => "waiting",
            StatementState::Running => "running",
            StatementState::Cancelling => "cancelling",
            StatementState::Cancelled => "cancelled",
            StatementState::Available => "available",
            StatementState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One remote execution context
///
/// The four resource-locator lists (`jars`, `py_files`, `files`, `archives`)
/// are snapshots of what was applied at creation time, not what is currently
/// desired; the service never mutates them after the session starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "proxyUser", skip_serializing_if = "Option::is_none")]
    pub proxy_user: Option<String>,
    pub kind: SessionKind,
    pub state: SessionState,
    #[serde(rename = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub jars: Vec<String>,
    #[serde(rename = "pyFiles", skip_serializing_if = "Vec::is_empty", default)]
    pub py_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub archives: Vec<String>,
    #[serde(rename = "driverMemory", skip_serializing_if = "Option::is_none")]
    pub driver_memory: Option<String>,
    #[serde(rename = "driverCores", skip_serializing_if = "Option::is_none")]
    pub driver_cores: Option<u32>,
    #[serde(rename = "executorMemory", skip_serializing_if = "Option::is_none")]
    pub executor_memory: Option<String>,
    #[serde(rename = "executorCores", skip_serializing_if = "Option::is_none")]
    pub executor_cores: Option<u32>,
    #[serde(rename = "numExecutors", skip_serializing_if = "Option::is_none")]
    pub num_executors: Option<u32>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub conf: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub log: Vec<String>,
}

/// Session creation request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub kind: SessionKind,
    #[validate(length(min = 1, message = "Session name cannot be empty"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "proxyUser", skip_serializing_if = "Option::is_none")]
    pub proxy_user: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub jars: Vec<String>,
    #[serde(rename = "pyFiles", skip_serializing_if = "Vec::is_empty", default)]
    pub py_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub archives: Vec<String>,
    #[serde(rename = "driverMemory", skip_serializing_if = "Option::is_none")]
    pub driver_memory: Option<String>,
    #[serde(rename = "driverCores", skip_serializing_if = "Option::is_none")]
    pub driver_cores: Option<u32>,
    #[serde(rename = "executorMemory", skip_serializing_if = "Option::is_none")]
    pub executor_memory: Option<String>,
    #[serde(rename = "executorCores", skip_serializing_if = "Option::is_none")]
    pub executor_cores: Option<u32>,
    #[serde(rename = "numExecutors", skip_serializing_if = "Option::is_none")]
    pub num_executors: Option<u32>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub conf: HashMap<String, String>,
    #[serde(
        rename = "heartbeatTimeoutInSecond",
        skip_serializing_if = "Option::is_none"
    )]
    pub heartbeat_timeout_in_second: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

/// Session list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub from: u32,
    pub total: u32,
    pub sessions: Vec<Session>,
}

/// One code submission within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: i64,
    pub code: String,
    pub state: StatementState,
    pub output: Option<StatementOutput>,
    #[serde(default)]
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<i64>,
}

impl Statement {
    /// Start timestamp as wall-clock time; the wire carries epoch milliseconds.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started.and_then(DateTime::from_timestamp_millis)
    }

    /// Completion timestamp as wall-clock time.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed.and_then(DateTime::from_timestamp_millis)
    }
}

/// Outcome status of a statement's output block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    Ok,
    Error,
}

/// Structured output of a completed statement
///
/// `data` is a MIME-type-keyed result map for `ok` output; the `ename`,
/// `evalue` and `traceback` fields are populated for `error` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementOutput {
    pub status: OutputStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evalue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<Vec<String>>,
}

impl StatementOutput {
    /// Render the output as human-readable text.
    ///
    /// Error output surfaces name, value and traceback; ok output surfaces the
    /// `text/plain` entry of the data map when present. Other MIME types are
    /// left to presentation layers.
    pub fn render(&self) -> Option<String> {
        match self.status {
            OutputStatus::Error => {
                let ename = self.ename.as_deref().unwrap_or("Error");
                let evalue = self.evalue.as_deref().unwrap_or("");
                let mut text = format!("{}: {}", ename, evalue);
                if let Some(traceback) = &self.traceback {
                    for line in traceback {
                        text.push('\n');
                        text.push_str(line);
                    }
                }
                Some(text)
            }
            OutputStatus::Ok => {
                let data = self.data.as_ref()?;
                match data.get("text/plain")? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                }
            }
        }
    }
}

/// Statement submission body: `{code, kind}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStatementRequest {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SessionKind>,
}

/// Statement list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementListResponse {
    pub total_statements: u32,
    pub statements: Vec<Statement>,
}

/// Paged session log response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogResponse {
    pub id: i64,
    pub from: u32,
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    pub log: Vec<String>,
}

/// Plain acknowledgement body, e.g. from session delete or statement cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMessage {
    pub msg: String,
}
