// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Diagnostics
//!
//! Policy findings produced by every check. A `Diagnostics` value is a plain
//! accumulator: checks build a fresh one, the dispatcher unions them.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the error / warning / info finding sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Three sets of diagnostic codes.
///
/// Merging is set union, so it is idempotent and order-irrelevant: running
/// checks concurrently and merging in completion order yields the same
/// result as running them sequentially.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub errors: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub warnings: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub info: BTreeSet<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: impl Into<String>) {
        self.errors.insert(code.into());
    }

    pub fn warning(&mut self, code: impl Into<String>) {
        self.warnings.insert(code.into());
    }

    pub fn info(&mut self, code: impl Into<String>) {
        self.info.insert(code.into());
    }

    /// Union `other` into `self`
    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.info.extend(other.info);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.info.is_empty()
    }
}

impl FromIterator<Diagnostics> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostics>>(iter: I) -> Self {
        let mut merged = Diagnostics::new();
        for diagnostics in iter {
            merged.merge(diagnostics);
        }
        merged
    }
}
