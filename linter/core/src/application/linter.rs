// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Check Dispatch
//!
//! Resolves one [`InputContext`] into a [`LintTarget`], runs every
//! configured check against it concurrently and applies exceptions to the
//! merged result.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the lint use case

use crate::application::checks::Check;
use crate::domain::appid::AppId;
use crate::domain::diagnostics::Diagnostics;
use crate::domain::exceptions::Exceptions;
use crate::domain::input::{InputContext, InputKind, LintError, LintTarget};
use crate::domain::permissions::{MetadataRecord, PermissionModel};
use crate::domain::sources::{ContentStore, ManifestLoader, MetadataReader};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;

const METADATA_FILE: &str = "metadata";
const APPLICATION_GROUP: &str = "Application";
const RUNTIME_GROUP: &str = "Runtime";
const EXTENSION_OF_GROUP: &str = "ExtensionOf";

/// Repository refs that never carry a lintable application
const AUXILIARY_SUFFIXES: [&str; 3] = [".Debug", ".Locale", ".Sources"];

pub struct Linter {
    checks: Vec<Arc<dyn Check>>,
    manifest_loader: Arc<dyn ManifestLoader>,
    metadata_reader: Arc<dyn MetadataReader>,
    content_store: Arc<dyn ContentStore>,
    exceptions: Option<Exceptions>,
    appid_override: Option<String>,
}

impl Linter {
    pub fn new(
        manifest_loader: Arc<dyn ManifestLoader>,
        metadata_reader: Arc<dyn MetadataReader>,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            checks: Vec::new(),
            manifest_loader,
            metadata_reader,
            content_store,
            exceptions: None,
            appid_override: None,
        }
    }

    pub fn with_check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    /// Enable exceptions filtering with this table
    pub fn with_exceptions(mut self, exceptions: Exceptions) -> Self {
        self.exceptions = Some(exceptions);
        self
    }

    /// Look exceptions up under this id instead of the input's own
    pub fn with_appid_override(mut self, appid: impl Into<String>) -> Self {
        self.appid_override = Some(appid.into());
        self
    }

    pub async fn lint(&self, context: &InputContext) -> Result<Diagnostics, LintError> {
        let target = self.resolve_target(context).await?;

        tracing::info!(
            kind = %target.kind,
            appid = %target.appid,
            extension = target.appid.is_extension(),
            "Linting"
        );

        let target = &target;
        let results = join_all(self.checks.iter().map(|check| async move {
            let diagnostics = check.run(target).await;
            tracing::debug!(
                check = check.name(),
                errors = diagnostics.errors.len(),
                warnings = diagnostics.warnings.len(),
                "Check finished"
            );
            diagnostics
        }))
        .await;

        let mut diagnostics: Diagnostics = results.into_iter().collect();

        if let Some(exceptions) = &self.exceptions {
            let appid = self.appid_override.as_deref().unwrap_or(target.appid.as_str());
            exceptions.apply(appid, &mut diagnostics);
        }

        Ok(diagnostics)
    }

    /// Turn any input representation into the source-agnostic target
    pub async fn resolve_target(&self, context: &InputContext) -> Result<LintTarget, LintError> {
        match context {
            InputContext::Manifest(path) => {
                let manifest = self.manifest_loader.load(path)?;
                Ok(LintTarget {
                    kind: InputKind::Manifest,
                    appid: manifest.appid,
                    permissions: manifest.permissions,
                    manifest_path: Some(path.clone()),
                })
            }
            InputContext::BuildDir(dir) => {
                let record = self.metadata_reader.read(&dir.join(METADATA_FILE))?;
                Ok(target_from_metadata(InputKind::BuildDir, &record, None))
            }
            InputContext::Repo(repo) => self.resolve_repo(repo).await,
        }
    }

    async fn resolve_repo(&self, repo: &Path) -> Result<LintTarget, LintError> {
        let refs = self.content_store.list_refs(repo).await?;
        let reference = select_ref(&refs).ok_or_else(|| LintError::NoLintableRef(repo.to_path_buf()))?;
        tracing::debug!(reference = %reference, "Selected repository ref");

        let checkout = tempfile::Builder::new()
            .prefix("finlint-")
            .tempdir()
            .map_err(|e| LintError::Extraction {
                repo: repo.to_path_buf(),
                reason: format!("Failed to create temporary directory: {}", e),
            })?;

        self.content_store
            .checkout_metadata(repo, reference, checkout.path())
            .await?;
        let record = self.metadata_reader.read(&checkout.path().join(METADATA_FILE))?;

        let mut target = target_from_metadata(InputKind::Repo, &record, ref_id(reference));
        if reference.starts_with("runtime/") && !target.appid.is_extension() {
            target.appid = AppId::extension(target.appid.as_str());
        }
        Ok(target)
    }
}

/// First `app/` ref, else first `runtime/` ref that is not auxiliary
fn select_ref(refs: &[String]) -> Option<&str> {
    refs.iter()
        .map(String::as_str)
        .find(|r| r.starts_with("app/"))
        .or_else(|| {
            refs.iter().map(String::as_str).find(|r| {
                r.starts_with("runtime/")
                    && ref_id(r).is_some_and(|id| !AUXILIARY_SUFFIXES.iter().any(|s| id.ends_with(s)))
            })
        })
}

/// Second path segment of `kind/id/arch/branch`
fn ref_id(reference: &str) -> Option<&str> {
    reference.split('/').nth(1).filter(|id| !id.is_empty())
}

fn target_from_metadata(kind: InputKind, record: &MetadataRecord, fallback_id: Option<&str>) -> LintTarget {
    let appid = if let Some(name) = record.get(APPLICATION_GROUP, "name") {
        if record.has_group(EXTENSION_OF_GROUP) {
            AppId::extension(name)
        } else {
            AppId::new(name)
        }
    } else if let Some(name) = record.get(RUNTIME_GROUP, "name") {
        AppId::extension(name)
    } else {
        tracing::warn!("Build metadata has no application or runtime name");
        AppId::new(fallback_id.unwrap_or_default())
    };

    LintTarget {
        kind,
        appid,
        permissions: Some(PermissionModel::from_metadata(record)),
        manifest_path: None,
    }
}
