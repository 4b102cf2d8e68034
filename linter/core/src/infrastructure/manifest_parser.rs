// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Build Manifest Parser
//!
//! Parses JSON or YAML build manifests into the small subset of fields the
//! linter consumes. Everything else in the manifest is ignored.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external JSON/YAML → Domain objects
//! - **Anti-Corruption:** Translates manifest keys to the canonical permission model
//!
//! # Manifest Format
//!
//! ```yaml
//! id: org.example.App
//! runtime: org.freedesktop.Platform
//! command: example
//! finish-args:
//!   - --socket=wayland
//!   - --device=dri
//! ```

use crate::domain::appid::AppId;
use crate::domain::input::LintError;
use crate::domain::permissions::PermissionModel;
use crate::domain::sources::{ManifestDeclaration, ManifestLoader};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildManifest {
    #[serde(default, alias = "app-id")]
    pub id: Option<String>,

    #[serde(default)]
    pub finish_args: Option<Vec<String>>,

    #[serde(default)]
    pub build_extension: Option<bool>,
}

impl BuildManifest {
    pub fn appid(&self) -> AppId {
        let raw = self.id.clone().unwrap_or_default();
        if self.build_extension.unwrap_or(false) {
            AppId::extension(raw)
        } else {
            AppId::new(raw)
        }
    }

    /// `None` when the manifest has no `finish-args` key at all
    pub fn permissions(&self) -> Option<PermissionModel> {
        self.finish_args
            .as_deref()
            .map(PermissionModel::from_finish_args)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_json(json: &str) -> Result<BuildManifest, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn parse_yaml(yaml: &str) -> Result<BuildManifest, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse by file extension: `.yaml`/`.yml` as YAML, anything else as JSON
    pub fn parse_file(path: &Path) -> Result<BuildManifest, LintError> {
        let content = std::fs::read_to_string(path).map_err(|source| LintError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let parsed = if is_yaml {
            Self::parse_yaml(&content).map_err(|e| e.to_string())
        } else {
            Self::parse_json(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|reason| LintError::ManifestParse {
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl ManifestLoader for ManifestParser {
    fn load(&self, path: &Path) -> Result<ManifestDeclaration, LintError> {
        let manifest = Self::parse_file(path)?;
        tracing::debug!(path = ?path, "Parsed build manifest");
        Ok(ManifestDeclaration {
            appid: manifest.appid(),
            permissions: manifest.permissions(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permissions::SOCKET;

    #[test]
    fn test_parse_json_manifest() {
        let manifest = ManifestParser::parse_json(
            r#"{
                "id": "org.example.App",
                "runtime": "org.freedesktop.Platform",
                "modules": [],
                "finish-args": ["--socket=wayland", "--share=ipc"]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.appid(), AppId::new("org.example.App"));
        let model = manifest.permissions().unwrap();
        assert!(model.contains(SOCKET, "wayland"));
    }

    #[test]
    fn test_parse_yaml_manifest_with_app_id_alias() {
        let manifest = ManifestParser::parse_yaml(
            "app-id: org.example.Plugin\nbuild-extension: true\n",
        )
        .unwrap();

        assert!(manifest.appid().is_extension());
        assert_eq!(manifest.appid().as_str(), "org.example.Plugin");
        assert!(manifest.permissions().is_none());
    }

    #[test]
    fn test_missing_id_is_empty_appid() {
        let manifest = ManifestParser::parse_json("{}").unwrap();
        assert_eq!(manifest.appid().as_str(), "");
    }

    #[test]
    fn test_parse_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("org.example.App.json");
        assert!(matches!(
            ManifestParser::parse_file(&missing),
            Err(LintError::ManifestRead { .. })
        ));

        let broken = dir.path().join("org.example.App.yaml");
        std::fs::write(&broken, "finish-args: [unterminated").unwrap();
        assert!(matches!(
            ManifestParser::parse_file(&broken),
            Err(LintError::ManifestParse { .. })
        ));
    }

    #[test]
    fn test_parse_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org.example.App.yml");
        std::fs::write(&path, "id: org.example.App\nfinish-args:\n  - --socket=x11\n").unwrap();

        let manifest = ManifestParser::parse_file(&path).unwrap();
        assert!(manifest.permissions().unwrap().contains(SOCKET, "x11"));
    }

    #[test]
    fn test_load_declares_extension_without_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org.example.App.Plugin.json");
        std::fs::write(&path, r#"{ "id": "org.example.App.Plugin", "build-extension": true }"#).unwrap();

        let declaration = ManifestParser::new().load(&path).unwrap();
        assert_eq!(declaration.appid, AppId::extension("org.example.App.Plugin"));
        assert!(declaration.permissions.is_none());
    }
}
