// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! REST client for the Livy-compatible execution service
//!
//! This crate provides the HTTP layer of the runtime: a generic JSON
//! transport with per-request auth resolution and cancellation, the typed
//! session/statement/log operations built on it, and the storage client that
//! implements the two-step redirect upload protocol.
//!
//! ## Design Principles
//!
//! This crate is designed to have minimal dependencies and can be used by
//! third-party software to drive the execution service directly. Lifecycle
//! orchestration (poll loops, the active-session handle, notifications) lives
//! in `livy-core`, which composes this client behind a trait; nothing here
//! holds long-lived state beyond the HTTP connection pool.

pub mod auth;
pub mod client;
pub mod error;
pub mod negotiate;
pub mod storage;

pub use auth::*;
pub use client::*;
pub use error::*;
pub use storage::*;
