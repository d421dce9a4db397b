// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Dependency status classification
//!
//! Pure derivation over (a) the declaratively-configured desired locator
//! lists and (b) the latest session snapshot. Recomputed on every query,
//! never cached, no network calls.

use livy_api_contract::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource categories a session can be seeded with at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Generic JVM archives (`jars`)
    Jars,
    /// Code archives for the interpreter (`pyFiles`)
    PyFiles,
    /// Generic files shipped to executors (`files`)
    Files,
    /// Archives extracted on the executors (`archives`)
    Archives,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 4] = [
        DependencyKind::Jars,
        DependencyKind::PyFiles,
        DependencyKind::Files,
        DependencyKind::Archives,
    ];

    /// The session list this category maps to.
    fn applied_list<'a>(&self, session: &'a Session) -> &'a [String] {
        match self {
            DependencyKind::Jars => &session.jars,
            DependencyKind::PyFiles => &session.py_files,
            DependencyKind::Files => &session.files,
            DependencyKind::Archives => &session.archives,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Jars => "jars",
            DependencyKind::PyFiles => "py_files",
            DependencyKind::Files => "files",
            DependencyKind::Archives => "archives",
        };
        write!(f, "{}", s)
    }
}

/// Declared desired set, one locator list per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesiredDependencies {
    pub jars: Vec<String>,
    pub py_files: Vec<String>,
    pub files: Vec<String>,
    pub archives: Vec<String>,
}

impl DesiredDependencies {
    fn list(&self, kind: DependencyKind) -> &[String] {
        match kind {
            DependencyKind::Jars => &self.jars,
            DependencyKind::PyFiles => &self.py_files,
            DependencyKind::Files => &self.files,
            DependencyKind::Archives => &self.archives,
        }
    }

    pub fn is_empty(&self) -> bool {
        DependencyKind::ALL.iter().all(|kind| self.list(*kind).is_empty())
    }
}

/// Whether a declared locator is confirmed present in the live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// Present in the session's corresponding applied list.
    Active,
    /// Not applied yet, or no live session to check against.
    Pending,
}

/// A declared locator with its computed status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub locator: String,
    pub kind: DependencyKind,
    pub status: DependencyStatus,
}

/// Classify every declared locator against the session snapshot.
///
/// Deterministic and side-effect-free: identical inputs yield identical
/// output, and a missing snapshot classifies every entry `Pending`.
pub fn resolve_dependencies(
    desired: &DesiredDependencies,
    snapshot: Option<&Session>,
) -> Vec<DependencyEntry> {
    let mut entries = Vec::new();
    for kind in DependencyKind::ALL {
        for locator in desired.list(kind) {
            let status = match snapshot {
                Some(session) if session_contains(session, kind, locator) => {
                    DependencyStatus::Active
                }
                _ => DependencyStatus::Pending,
            };
            entries.push(DependencyEntry {
                locator: locator.clone(),
                kind,
                status,
            });
        }
    }
    entries
}

fn session_contains(session: &Session, kind: DependencyKind, locator: &str) -> bool {
    kind.applied_list(session).iter().any(|applied| applied == locator)
}
