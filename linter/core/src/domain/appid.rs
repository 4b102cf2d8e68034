// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application Identifier
//!
//! The reverse-DNS identifier naming an application, and the structural
//! grammar checks run over it before anything tries to reason about the
//! domain it encodes.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the AppID value type and structural validator

use crate::domain::diagnostics::Diagnostics;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

pub const MAX_LENGTH: usize = 255;
pub const MIN_COMPONENTS: usize = 3;
/// Applications may use at most this many components minus one
pub const MAX_APP_COMPONENTS: usize = 6;

const BASE_APP_SUFFIX: &str = ".BaseApp";

static COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid component regex"));

/// Code-forge second components and the top-level domain each must pair with
const CODE_FORGES: &[(&str, &str)] = &[("github", "io"), ("gitlab", "io"), ("codeberg", "page")];

/// Dotted application identifier. Parsed once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppId {
    raw: String,
    is_extension: bool,
}

impl AppId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            is_extension: false,
        }
    }

    pub fn extension(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            is_extension: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> Vec<&str> {
        self.raw.split('.').collect()
    }

    pub fn is_extension(&self) -> bool {
        self.is_extension
    }

    pub fn is_base_app(&self) -> bool {
        self.raw.ends_with(BASE_APP_SUFFIX)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Outcome of the structural checks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralValidation {
    pub diagnostics: Diagnostics,
    /// False once a check recorded a fatal finding; later reasoning about
    /// the identifier (domain provenance) must not run.
    pub structurally_valid: bool,
}

impl StructuralValidation {
    fn fatal(code: &str) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(code);
        Self {
            diagnostics,
            structurally_valid: false,
        }
    }
}

/// Run the ordered structural checks, stopping at the first fatal one
pub fn validate_structure(appid: &AppId) -> StructuralValidation {
    let raw = appid.as_str();

    if raw.is_empty() {
        return StructuralValidation::fatal("appid-not-defined");
    }

    if raw.len() > MAX_LENGTH {
        return StructuralValidation::fatal("appid-length-more-than-255-chars");
    }

    let components = appid.components();

    if components.len() < MIN_COMPONENTS {
        return StructuralValidation::fatal("appid-less-than-3-components");
    }

    if components.iter().any(|c| !COMPONENT.is_match(c)) {
        return StructuralValidation::fatal("appid-component-wrong-syntax");
    }

    if !appid.is_extension() && !appid.is_base_app() && components.len() >= MAX_APP_COMPONENTS {
        return StructuralValidation::fatal("appid-too-many-components-for-app");
    }

    let mut result = StructuralValidation {
        diagnostics: Diagnostics::new(),
        structurally_valid: true,
    };

    if components.last() == Some(&"desktop") {
        result.diagnostics.error("appid-ends-with-lowercase-desktop");
    }

    let second = components[1].to_lowercase();
    if let Some((_, tld)) = CODE_FORGES.iter().find(|(forge, _)| *forge == second) {
        if !components[0].eq_ignore_ascii_case(tld) {
            result.diagnostics.error("appid-uses-code-hosting-domain");
        }
        if components.len() < 4 {
            result.diagnostics.error("appid-code-hosting-too-few-components");
            result.structurally_valid = false;
        }
    }

    result
}
