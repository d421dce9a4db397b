// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Session and statement lifecycle orchestration.
//!
//! This crate turns the asynchronous, eventually-consistent REST resources of
//! the execution service into synchronous-feeling operations: create-then-poll
//! for sessions, submit-then-poll for statements, with explicit timeout,
//! cancellation and failure semantics. It owns the only mutable shared state
//! of the runtime (the active-session handle and the log cursor) and emits
//! lifecycle notifications for UI collaborators to consume.

pub mod dependencies;
pub mod error;
pub mod events;
pub mod execution_api;
pub mod session_manager;
pub mod settings;
pub mod ui;

/// Core result type used throughout the runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type that encompasses all lifecycle operations.
pub use error::Error;

/// Dependency classification over declared locators and the live snapshot.
pub use dependencies::{
    resolve_dependencies, DependencyEntry, DependencyKind, DependencyStatus, DesiredDependencies,
};

/// Lifecycle notifications consumed by UI collaborators.
pub use events::LifecycleEvent;

/// Client abstraction for different execution-service backends (real, mock).
pub use execution_api::ExecutionApi;

/// Session/statement lifecycle management and orchestration.
pub use session_manager::{CreateOutcome, ExecuteOutcome, KillAllReport, SessionManager};

/// Lifecycle manager tuning knobs.
pub use settings::ManagerSettings;
