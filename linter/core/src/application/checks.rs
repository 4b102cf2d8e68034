// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Checks
//!
//! Independent checks over a resolved [`LintTarget`]. Each check returns a
//! fresh [`Diagnostics`]; the dispatcher unions them.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wires the pure domain rules to their collaborators

use crate::domain::appid::validate_structure;
use crate::domain::diagnostics::Diagnostics;
use crate::domain::finish_args;
use crate::domain::input::LintTarget;
use crate::domain::permissions::PermissionModel;
use crate::domain::provenance::{ProvenanceResolver, PublishedCatalog};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

const MANIFEST_SUFFIXES: [&str; 3] = [".json", ".yaml", ".yml"];

#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, target: &LintTarget) -> Diagnostics;
}

struct OnlineProvenance {
    resolver: ProvenanceResolver,
    catalog: Arc<dyn PublishedCatalog>,
}

/// Identifier structure, manifest file name and provenance
pub struct AppIdCheck {
    online: Option<OnlineProvenance>,
}

impl AppIdCheck {
    pub fn new(resolver: ProvenanceResolver, catalog: Arc<dyn PublishedCatalog>) -> Self {
        Self {
            online: Some(OnlineProvenance { resolver, catalog }),
        }
    }

    /// Structural checks only; provenance is reported as skipped
    pub fn offline() -> Self {
        Self { online: None }
    }

    async fn check_provenance(&self, target: &LintTarget, diagnostics: &mut Diagnostics) {
        let Some(online) = &self.online else {
            tracing::debug!(appid = %target.appid, "Network disabled, skipping provenance");
            diagnostics.info("appid-provenance-check-skipped");
            return;
        };

        if online.catalog.is_published(target.appid.as_str()).await {
            tracing::debug!(appid = %target.appid, "Already published, skipping provenance");
            return;
        }

        diagnostics.merge(online.resolver.verify(&target.appid).await);
    }
}

fn manifest_stem(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    Some(
        MANIFEST_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(name),
    )
}

#[async_trait]
impl Check for AppIdCheck {
    fn name(&self) -> &'static str {
        "appid"
    }

    async fn run(&self, target: &LintTarget) -> Diagnostics {
        let validation = validate_structure(&target.appid);
        let mut diagnostics = validation.diagnostics;

        if let Some(manifest) = &target.manifest_path {
            let appid = target.appid.as_str();
            if !appid.is_empty() && manifest_stem(manifest) != Some(appid) {
                diagnostics.error("appid-filename-mismatch");
            }
        }

        if validation.structurally_valid && !target.appid.is_extension() && !target.appid.is_base_app() {
            self.check_provenance(target, &mut diagnostics).await;
        }

        diagnostics
    }
}

/// Sandbox permission policy
#[derive(Debug, Default)]
pub struct FinishArgsCheck;

impl FinishArgsCheck {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Check for FinishArgsCheck {
    fn name(&self) -> &'static str {
        "finish-args"
    }

    async fn run(&self, target: &LintTarget) -> Diagnostics {
        if target.appid.is_extension() {
            return Diagnostics::new();
        }

        match &target.permissions {
            Some(model) => finish_args::evaluate(&target.appid, model),
            None => finish_args::evaluate(&target.appid, &PermissionModel::default()),
        }
    }
}
