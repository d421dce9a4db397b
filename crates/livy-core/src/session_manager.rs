// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Session and statement lifecycle manager
//!
//! Owns the active-session handle and the log cursor, and runs the
//! poll-until-terminal loops for session creation and statement execution.
//! Operations take `&mut self`, so at most one create/poll or execute/poll
//! cycle can be outstanding per manager; the exclusive borrow is what keeps
//! the handle consistent.
//!
//! Failure semantics, uniformly applied:
//! - a fired cancellation signal resolves to an `Aborted` outcome, never an
//!   error, and aborts in-flight delays immediately;
//! - terminal failure states and the creation deadline surface typed errors
//!   and leave the active handle untouched;
//! - best-effort sub-steps (refreshing a snapshot after completion, the
//!   advisory statement cancel, killing an abandoned session) swallow their
//!   own errors and log them.

use livy_api_contract::{
    CreateSessionRequest, CreateStatementRequest, Session, SessionKind, SessionLogResponse,
    SessionState, Statement,
};
use livy_rest_client::RestClientError;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dependencies::{self, DependencyEntry, DesiredDependencies};
use crate::error::Error;
use crate::events::LifecycleEvent;
use crate::execution_api::ExecutionApi;
use crate::settings::ManagerSettings;
use crate::ui::ConfirmPrompt;
use crate::Result;

/// Capacity of the lifecycle notification channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of a create/poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The session reached `idle` and was installed as active.
    Ready(Session),
    /// The caller cancelled; the remote session was left to its own devices
    /// unless `kill_on_cancel` is set.
    Aborted,
}

/// Result of an execute/poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// The statement reached a terminal state.
    Completed(Statement),
    /// The caller cancelled; a best-effort server-side cancel was issued.
    Aborted,
}

/// Tally of a kill-all sweep; partial failures are counted, not fatal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillAllReport {
    pub killed: u32,
    pub failed: u32,
}

/// Lifecycle manager over any [`ExecutionApi`] backend
#[derive(Debug)]
pub struct SessionManager<C> {
    client: C,
    settings: ManagerSettings,
    active: Option<Session>,
    log_cursor: u32,
    events: broadcast::Sender<LifecycleEvent>,
}

impl<C: ExecutionApi> SessionManager<C> {
    pub fn new(client: C) -> Self {
        Self::with_settings(client, ManagerSettings::default())
    }

    pub fn with_settings(client: C, settings: ManagerSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            settings,
            active: None,
            log_cursor: 0,
            events,
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The session the caller is currently bound to, if any
    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Subscribe to lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Create a session and poll it to `idle`.
    ///
    /// Polls every `poll_interval` until the session is `idle` (success), a
    /// terminal failure state or the creation deadline is reached (typed
    /// error), or `cancel` fires (aborted). On success the session is
    /// installed as active and a [`LifecycleEvent::SessionChanged`] fires; on
    /// failure or abort the active handle keeps its previous value.
    pub async fn create_session(
        &mut self,
        request: &CreateSessionRequest,
        cancel: &CancellationToken,
    ) -> Result<CreateOutcome> {
        let created = match self.client.create_session(request, cancel).await {
            Ok(session) => session,
            Err(RestClientError::Cancelled) => return Ok(CreateOutcome::Aborted),
            Err(err) => return Err(err.into()),
        };
        let id = created.id;
        debug!(id, kind = %created.kind, "session creation requested");

        let deadline = Instant::now() + self.settings.creation_timeout;
        let mut latest = created;
        loop {
            if latest.state == SessionState::Idle {
                self.install_active(latest.clone());
                return Ok(CreateOutcome::Ready(latest));
            }
            if latest.state.is_terminal() {
                return Err(Error::StartupFailed {
                    id,
                    state: latest.state,
                });
            }
            if Instant::now() >= deadline {
                return Err(Error::StartupTimeout {
                    id,
                    timeout: self.settings.creation_timeout,
                });
            }
            if wait_interval(self.settings.poll_interval, cancel).await {
                return Ok(self.abandon_creation(id).await);
            }
            latest = match self.client.get_session(id, cancel).await {
                Ok(session) => session,
                Err(RestClientError::Cancelled) => return Ok(self.abandon_creation(id).await),
                Err(err) => return Err(err.into()),
            };
        }
    }

    /// Attach to an existing session by id, without polling.
    ///
    /// The session is assumed to already be in a stable state; it is
    /// installed as active and the log cursor is reset.
    pub async fn connect_to_existing(
        &mut self,
        session_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Session> {
        let session = self.client.get_session(session_id, cancel).await?;
        self.install_active(session.clone());
        Ok(session)
    }

    /// Delete a session, defaulting to the active one.
    ///
    /// The handle is cleared whenever the target equals the active session,
    /// regardless of how the delete went; a 404 on an already-gone session is
    /// not escalated.
    pub async fn kill_session(
        &mut self,
        session_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let target = session_id
            .or_else(|| self.active.as_ref().map(|session| session.id))
            .ok_or(Error::NoActiveSession)?;

        let result = self.client.delete_session(target, cancel).await;
        if self.active.as_ref().map(|session| session.id) == Some(target) {
            self.clear_active();
        }
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(id = target, "session already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete every session the service lists, after confirmation.
    ///
    /// Returns `None` when the prompt declines. Deletes are attempted
    /// independently; the report tallies partial failures. The active handle
    /// is cleared unconditionally afterwards.
    pub async fn kill_all(
        &mut self,
        confirm: &dyn ConfirmPrompt,
        cancel: &CancellationToken,
    ) -> Result<Option<KillAllReport>> {
        let listing = self.client.list_sessions(cancel).await?;
        let message = format!("Kill all {} sessions?", listing.sessions.len());
        if !confirm.confirm(&message).await {
            return Ok(None);
        }

        let mut report = KillAllReport::default();
        for session in &listing.sessions {
            match self.client.delete_session(session.id, cancel).await {
                Ok(_) => report.killed += 1,
                Err(err) => {
                    warn!(id = session.id, %err, "failed to kill session");
                    report.failed += 1;
                }
            }
        }
        self.clear_active();
        Ok(Some(report))
    }

    /// Best-effort re-attach at startup.
    ///
    /// A session that can no longer be fetched is an expected steady-state
    /// condition, not an error: the stored id is discarded, the handle is
    /// cleared, and `None` is returned.
    pub async fn restore_session(&mut self, saved_id: i64) -> Option<Session> {
        let cancel = CancellationToken::new();
        match self.client.get_session(saved_id, &cancel).await {
            Ok(session) => {
                self.install_active(session.clone());
                Some(session)
            }
            Err(err) => {
                debug!(id = saved_id, %err, "stored session not restorable; discarding");
                self.clear_active();
                None
            }
        }
    }

    /// Submit a statement against the active session and poll it to a
    /// terminal state.
    ///
    /// Fails immediately, without a network call, when no usable session is
    /// active. There is no timeout: the loop runs until the statement is
    /// terminal or `cancel` fires, in which case one advisory server-side
    /// cancel is issued and the outcome is `Aborted`. On completion the
    /// active snapshot is refreshed best-effort and a
    /// [`LifecycleEvent::StatementCompleted`] fires.
    pub async fn execute_code(
        &mut self,
        code: &str,
        kind: Option<SessionKind>,
        cancel: &CancellationToken,
    ) -> Result<ExecuteOutcome> {
        let session_id = match &self.active {
            None => return Err(Error::NoActiveSession),
            Some(session) if session.state.is_terminal() => {
                return Err(Error::SessionNotUsable {
                    id: session.id,
                    state: session.state,
                })
            }
            Some(session) => session.id,
        };

        let request = CreateStatementRequest {
            code: code.to_string(),
            kind,
        };
        let submitted = match self.client.create_statement(session_id, &request, cancel).await {
            Ok(statement) => statement,
            Err(RestClientError::Cancelled) => return Ok(ExecuteOutcome::Aborted),
            Err(err) => return Err(err.into()),
        };
        let statement_id = submitted.id;
        debug!(session_id, statement_id, "statement submitted");

        let mut latest = submitted;
        loop {
            if cancel.is_cancelled() {
                return Ok(self.abandon_statement(session_id, statement_id).await);
            }
            if latest.state.is_terminal() {
                self.refresh_active_snapshot(session_id).await;
                self.emit(LifecycleEvent::StatementCompleted {
                    session_id,
                    statement: latest.clone(),
                });
                return Ok(ExecuteOutcome::Completed(latest));
            }
            if wait_interval(self.settings.poll_interval, cancel).await {
                return Ok(self.abandon_statement(session_id, statement_id).await);
            }
            latest = match self.client.get_statement(session_id, statement_id, cancel).await {
                Ok(statement) => statement,
                Err(RestClientError::Cancelled) => {
                    return Ok(self.abandon_statement(session_id, statement_id).await)
                }
                Err(err) => return Err(err.into()),
            };
        }
    }

    /// Fetch a page of session log lines from an explicit offset.
    pub async fn fetch_logs_from(
        &self,
        from: u32,
        size: u32,
        cancel: &CancellationToken,
    ) -> Result<SessionLogResponse> {
        let session_id = self.active_session_id()?;
        Ok(self.client.get_session_log(session_id, from, size, cancel).await?)
    }

    /// Fetch the next page of session log lines, continuing from the cursor.
    ///
    /// The cursor advances by the number of rows actually returned and is
    /// reset to zero whenever a session is created, connected or restored.
    pub async fn fetch_next_logs(
        &mut self,
        size: u32,
        cancel: &CancellationToken,
    ) -> Result<SessionLogResponse> {
        let session_id = self.active_session_id()?;
        let page = self
            .client
            .get_session_log(session_id, self.log_cursor, size, cancel)
            .await?;
        self.log_cursor = page.from + page.log.len() as u32;
        Ok(page)
    }

    /// Fetch the last `size` rows of the session log.
    ///
    /// Probes the total with a 1-row fetch, then reads from
    /// `max(0, total - size)`. Does not move the cursor.
    pub async fn tail_logs(
        &self,
        size: u32,
        cancel: &CancellationToken,
    ) -> Result<SessionLogResponse> {
        let session_id = self.active_session_id()?;
        let probe = self.client.get_session_log(session_id, 0, 1, cancel).await?;
        let total = probe.total.unwrap_or(0);
        let from = total.saturating_sub(size);
        Ok(self.client.get_session_log(session_id, from, size, cancel).await?)
    }

    /// Classify the declared dependency set against the active snapshot.
    pub fn dependency_entries(&self, desired: &DesiredDependencies) -> Vec<DependencyEntry> {
        dependencies::resolve_dependencies(desired, self.active.as_ref())
    }

    // Internal plumbing

    fn active_session_id(&self) -> Result<i64> {
        self.active
            .as_ref()
            .map(|session| session.id)
            .ok_or(Error::NoActiveSession)
    }

    /// Record the new active session, reset session-scoped cursors, then notify.
    fn install_active(&mut self, session: Session) {
        self.log_cursor = 0;
        self.active = Some(session.clone());
        self.emit(LifecycleEvent::SessionChanged(Some(session)));
    }

    fn clear_active(&mut self) {
        if self.active.take().is_some() {
            self.emit(LifecycleEvent::SessionChanged(None));
        }
    }

    fn emit(&self, event: LifecycleEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// A creation poll was cancelled. The remote session keeps starting on
    /// its own unless the kill-on-cancel policy is enabled.
    async fn abandon_creation(&self, session_id: i64) -> CreateOutcome {
        if self.settings.kill_on_cancel {
            let cancel = CancellationToken::new();
            if let Err(err) = self.client.delete_session(session_id, &cancel).await {
                warn!(id = session_id, %err, "failed to kill session after cancelled creation");
            }
        }
        CreateOutcome::Aborted
    }

    /// Advisory server-side cancel; its own failures are swallowed.
    async fn abandon_statement(&self, session_id: i64, statement_id: i64) -> ExecuteOutcome {
        let cancel = CancellationToken::new();
        if let Err(err) = self.client.cancel_statement(session_id, statement_id, &cancel).await {
            warn!(session_id, statement_id, %err, "best-effort statement cancel failed");
        }
        ExecuteOutcome::Aborted
    }

    /// Refresh the active snapshot after a statement completes; a failure
    /// here does not invalidate the statement result.
    async fn refresh_active_snapshot(&mut self, session_id: i64) {
        let cancel = CancellationToken::new();
        match self.client.get_session(session_id, &cancel).await {
            Ok(session) => {
                if self.active.as_ref().map(|active| active.id) == Some(session_id) {
                    self.active = Some(session);
                }
            }
            Err(err) => warn!(session_id, %err, "failed to refresh session snapshot"),
        }
    }
}

/// Cancellable inter-poll delay: true when the signal fired before the
/// interval elapsed.
async fn wait_interval(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = sleep(delay) => false,
    }
}
