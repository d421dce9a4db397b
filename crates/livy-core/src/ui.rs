// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Consumed collaborator interfaces
//!
//! The core calls these as side-effecting functions and never inspects their
//! return values beyond confirm/selection results. Implementations belong to
//! the embedding UI layer; tests supply trivial ones.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Yes/no confirmation with a message
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// One selectable row offered to a picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
}

/// Label/description list selection; `None` when dismissed
#[async_trait]
pub trait Picker: Send + Sync {
    async fn pick(&self, items: &[PickItem]) -> Option<String>;
}

/// Progress surface: a titled, optionally cancellable indicator whose signal
/// the core observes at every suspension point
pub trait ProgressSurface: Send + Sync {
    fn begin(&self, title: &str, cancellable: bool) -> CancellationToken;
}

/// Append-only sink for human-readable status lines
pub trait StatusSink: Send + Sync {
    fn append_line(&self, line: &str);
}
