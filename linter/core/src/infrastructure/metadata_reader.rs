// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Build metadata key-file reader backed by `rust-ini`.

use crate::domain::input::LintError;
use crate::domain::permissions::MetadataRecord;
use crate::domain::sources::MetadataReader;
use ini::{Ini, ParseOption};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct KeyFileMetadataReader;

impl KeyFileMetadataReader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(content: &str) -> Result<MetadataRecord, String> {
        // Values such as `filesystems=xdg-config/app;!home;` are taken verbatim.
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, option).map_err(|e| e.to_string())?;

        let mut record = MetadataRecord::new();
        for (section, properties) in &ini {
            let Some(group) = section else {
                continue;
            };
            record.ensure_group(group);
            for (key, value) in properties.iter() {
                record.insert(group, key, value);
            }
        }
        Ok(record)
    }
}

impl MetadataReader for KeyFileMetadataReader {
    fn read(&self, path: &Path) -> Result<MetadataRecord, LintError> {
        if !path.is_file() {
            return Err(LintError::MetadataMissing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| LintError::MetadataRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let record = Self::parse_str(&content).map_err(|reason| LintError::MetadataRead {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::debug!(path = ?path, "Read build metadata");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = "\
[Application]
name=org.example.App
runtime=org.freedesktop.Platform/x86_64/24.08

[Context]
shared=network;ipc;
sockets=x11;wayland;
filesystems=xdg-config/example:ro;!home;

[Session Bus Policy]
org.freedesktop.Notifications=talk

[Extension org.example.App.Plugin]
directory=extensions
";

    #[test]
    fn test_parse_groups_and_keys() {
        let record = KeyFileMetadataReader::parse_str(METADATA).unwrap();
        assert_eq!(record.get("Application", "name"), Some("org.example.App"));
        assert_eq!(record.get("Context", "filesystems"), Some("xdg-config/example:ro;!home;"));
        assert_eq!(record.get("Session Bus Policy", "org.freedesktop.Notifications"), Some("talk"));
        assert!(record.has_group("Extension org.example.App.Plugin"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = KeyFileMetadataReader::new().read(&dir.path().join("metadata"));
        assert!(matches!(result, Err(LintError::MetadataMissing(_))));
    }

    #[test]
    fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata");
        std::fs::write(&path, METADATA).unwrap();

        let record = KeyFileMetadataReader::new().read(&path).unwrap();
        assert_eq!(record.get("Context", "shared"), Some("network;ipc;"));
    }
}
