// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lint Inputs
//!
//! The three representations an application can be linted from, the
//! resolved target every check consumes, and the infrastructure failures
//! that stop a target from being resolved at all.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements the input-context tagged union

use crate::domain::appid::AppId;
use crate::domain::permissions::PermissionModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which representation a path holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Build manifest (JSON or YAML)
    Manifest,
    /// Installed build directory containing a `metadata` key-file
    BuildDir,
    /// Content-addressed repository
    Repo,
}

impl InputKind {
    /// Guess the kind from what is on disk
    pub fn infer(path: &Path) -> Option<Self> {
        if path.is_file() {
            return Some(InputKind::Manifest);
        }
        if path.is_dir() {
            if path.join("config").is_file() && path.join("objects").is_dir() {
                return Some(InputKind::Repo);
            }
            if path.join("metadata").is_file() {
                return Some(InputKind::BuildDir);
            }
        }
        None
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Manifest => write!(f, "manifest"),
            InputKind::BuildDir => write!(f, "builddir"),
            InputKind::Repo => write!(f, "repo"),
        }
    }
}

/// One input to lint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputContext {
    Manifest(PathBuf),
    BuildDir(PathBuf),
    Repo(PathBuf),
}

impl InputContext {
    pub fn new(kind: InputKind, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match kind {
            InputKind::Manifest => InputContext::Manifest(path),
            InputKind::BuildDir => InputContext::BuildDir(path),
            InputKind::Repo => InputContext::Repo(path),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            InputContext::Manifest(_) => InputKind::Manifest,
            InputContext::BuildDir(_) => InputKind::BuildDir,
            InputContext::Repo(_) => InputKind::Repo,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            InputContext::Manifest(path) | InputContext::BuildDir(path) | InputContext::Repo(path) => path,
        }
    }
}

/// Resolved, source-agnostic view of an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintTarget {
    pub kind: InputKind,
    pub appid: AppId,
    /// `None` when the input carries no sandbox permissions at all
    pub permissions: Option<PermissionModel>,
    /// Set for manifest inputs; used for the file-name check
    pub manifest_path: Option<PathBuf>,
}

/// The input could not be evaluated. Distinct from policy findings.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("Failed to read manifest {path:?}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path:?}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("Build metadata not found at {0:?}")]
    MetadataMissing(PathBuf),

    #[error("Failed to read build metadata {path:?}: {reason}")]
    MetadataRead { path: PathBuf, reason: String },

    #[error("Failed to extract from repository {repo:?}: {reason}")]
    Extraction { repo: PathBuf, reason: String },

    #[error("Repository {0:?} contains no lintable ref")]
    NoLintableRef(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to load exceptions from {origin}: {reason}")]
    ExceptionsLoad { origin: String, reason: String },
}
