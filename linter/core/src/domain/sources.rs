// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Input Source Interfaces
//!
//! Contracts for the on-disk collaborators the linter reads inputs through.
//! Interfaces live in the domain layer and are implemented in
//! `crate::infrastructure`.
//!
//! | Trait | Reads | Implementations |
//! |-------|-------|----------------|
//! | `MetadataReader` | build `metadata` key-file | `KeyFileMetadataReader` |
//! | `ManifestLoader` | JSON / YAML build manifest | `ManifestParser` |
//! | `ContentStore` | repository refs and scoped checkouts | `OstreeContentStore` |

use crate::domain::appid::AppId;
use crate::domain::input::LintError;
use crate::domain::permissions::{MetadataRecord, PermissionModel};
use async_trait::async_trait;
use std::path::Path;

/// Parse a key-file into a [`MetadataRecord`]
pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<MetadataRecord, LintError>;
}

/// What a build manifest declares about the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDeclaration {
    pub appid: AppId,
    /// `None` when the manifest has no `finish-args` key at all
    pub permissions: Option<PermissionModel>,
}

/// Load the lintable subset of a build manifest
pub trait ManifestLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ManifestDeclaration, LintError>;
}

/// Content-addressed repository access
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All refs in the repository, in the order the store reports them
    async fn list_refs(&self, repo: &Path) -> Result<Vec<String>, LintError>;

    /// Check out only the `metadata` file of `reference` into `dest`
    async fn checkout_metadata(&self, repo: &Path, reference: &str, dest: &Path) -> Result<(), LintError>;
}
