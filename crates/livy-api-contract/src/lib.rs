// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Wire contract types for the Livy-compatible interactive session API
//!
//! This crate defines the request and response types exchanged with the
//! execution service, exactly mirroring the JSON wire format: session and
//! statement resources, their lifecycle state enumerations, log pagination,
//! and request validation. It deliberately contains no HTTP machinery so that
//! both the client and any test double can share one source of truth for the
//! protocol.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
