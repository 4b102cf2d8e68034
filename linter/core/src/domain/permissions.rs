// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Permission Model
//!
//! Normalizes the two sandbox-permission representations an application can
//! arrive in into one canonical, source-agnostic model:
//!
//! - the manifest's flat `finish-args` list (`--socket=x11`, `--nodevice=dri`, ...)
//! - the build metadata key-file (`[Context] sockets=x11;`, bus policy groups, ...)
//!
//! Policy rules only ever see the canonical form, so they never branch on
//! where a permission came from.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer between input formats and policy rules

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const SOCKET: &str = "socket";
pub const SHARE: &str = "share";
pub const FILESYSTEM: &str = "filesystem";
pub const DEVICE: &str = "device";
pub const OWN_NAME: &str = "own-name";
pub const TALK_NAME: &str = "talk-name";
pub const SYSTEM_OWN_NAME: &str = "system-own-name";
pub const SYSTEM_TALK_NAME: &str = "system-talk-name";
pub const ENV: &str = "env";

/// Prefix marking an explicitly denied token
pub const NEGATION: char = '!';

const CONTEXT_GROUP: &str = "Context";
const SESSION_BUS_GROUP: &str = "Session Bus Policy";
const SYSTEM_BUS_GROUP: &str = "System Bus Policy";
const ENVIRONMENT_GROUP: &str = "Environment";

/// Grouped key/value record read from a build's `metadata` key-file.
///
/// Produced by the metadata reader collaborator; groups and keys keep the
/// spelling found in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    groups: BTreeMap<String, BTreeMap<String, String>>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Register a group even if it ends up without keys (e.g. `[ExtensionOf]`)
    pub fn ensure_group(&mut self, group: impl Into<String>) {
        self.groups.entry(group.into()).or_default();
    }

    pub fn group(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.groups.get(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups.get(group)?.get(key).map(String::as_str)
    }
}

/// Canonical permission model: category → set of tokens.
///
/// A token starting with `!` is an explicit negation. Category names are
/// always the normalized singular forms. There is no mutating API; a model
/// is built once per input and then only queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionModel {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl PermissionModel {
    /// Build from a manifest's `finish-args` list
    pub fn from_finish_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut builder = Builder::default();

        for arg in args {
            let arg = arg.as_ref().trim();
            let Some((key, value)) = arg.strip_prefix("--").and_then(|rest| rest.split_once('=')) else {
                tracing::debug!(arg = %arg, "Ignoring finish-arg without --key=value form");
                continue;
            };

            let (category, negated) = normalize_flag(key);
            builder.insert(category, value, negated);
        }

        builder.finish()
    }

    /// Build from an installed build's metadata record
    pub fn from_metadata(record: &MetadataRecord) -> Self {
        let mut builder = Builder::default();

        if let Some(context) = record.group(CONTEXT_GROUP) {
            for (key, value) in context {
                let category = normalize_context_key(key);
                for token in split_list(value) {
                    builder.insert(category, token, false);
                }
            }
        }

        for (group, prefix) in [(SESSION_BUS_GROUP, ""), (SYSTEM_BUS_GROUP, "system-")] {
            if let Some(policy) = record.group(group) {
                for (bus_name, level) in policy {
                    let category = format!("{}{}-name", prefix, level.trim());
                    builder.insert(&category, bus_name, false);
                }
            }
        }

        if let Some(environment) = record.group(ENVIRONMENT_GROUP) {
            for (key, value) in environment {
                builder.insert(ENV, &format!("{}={}", key, value), false);
            }
        }

        // Older builds recorded both; fallback-x11 supersedes x11 on this path.
        if let Some(sockets) = builder.categories.get_mut(SOCKET) {
            if sockets.contains("fallback-x11") && sockets.remove("x11") {
                tracing::debug!("Dropping x11 socket in favour of fallback-x11 from build metadata");
            }
        }

        builder.finish()
    }

    /// Build directly from (category, token) pairs. Category names are
    /// normalized the same way metadata keys are.
    #[cfg(test)]
    pub(crate) fn from_tokens<I, C, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: AsRef<str>,
        T: AsRef<str>,
    {
        let mut builder = Builder::default();
        for (category, token) in pairs {
            builder.insert(normalize_context_key(category.as_ref()), token.as_ref(), false);
        }
        builder.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeSet::is_empty)
    }

    #[cfg(test)]
    pub(crate) fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// All tokens of a category, negations included
    pub fn tokens(&self, category: &str) -> impl Iterator<Item = &str> {
        self.categories
            .get(category)
            .into_iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
    }

    /// Tokens that grant something (no `!` prefix)
    pub fn grants(&self, category: &str) -> impl Iterator<Item = &str> {
        self.tokens(category).filter(|t| !t.starts_with(NEGATION))
    }

    /// Values that are explicitly denied, without the `!` prefix
    pub fn negations(&self, category: &str) -> impl Iterator<Item = &str> {
        self.tokens(category).filter_map(|t| t.strip_prefix(NEGATION))
    }

    pub fn contains(&self, category: &str, token: &str) -> bool {
        self.categories
            .get(category)
            .is_some_and(|tokens| tokens.contains(token))
    }
}

#[derive(Default)]
struct Builder {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl Builder {
    fn insert(&mut self, category: &str, value: &str, negated: bool) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let token = if negated {
            format!("{}{}", NEGATION, value)
        } else {
            value.to_string()
        };
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(token);
    }

    fn finish(self) -> PermissionModel {
        PermissionModel {
            categories: self.categories,
        }
    }
}

/// Map a finish-args flag name to its canonical category and whether the
/// flag is the negating variant.
fn normalize_flag(key: &str) -> (&str, bool) {
    match key {
        "socket" => (SOCKET, false),
        "nosocket" => (SOCKET, true),
        "share" => (SHARE, false),
        "unshare" => (SHARE, true),
        "device" => (DEVICE, false),
        "nodevice" => (DEVICE, true),
        "filesystem" => (FILESYSTEM, false),
        "nofilesystem" => (FILESYSTEM, true),
        "allow" => ("allow", false),
        "disallow" => ("allow", true),
        other => (other, false),
    }
}

/// Map a metadata `[Context]` key to its canonical category
fn normalize_context_key(key: &str) -> &str {
    match key {
        "shared" => SHARE,
        "sockets" => SOCKET,
        "filesystems" => FILESYSTEM,
        "devices" => DEVICE,
        "features" => "allow",
        "persistent" => "persist",
        other => other,
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(';').map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(entries: &[(&str, &str, &str)]) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        for (group, key, value) in entries {
            record.insert(*group, *key, *value);
        }
        record
    }

    // ── Manifest path ────────────────────────────────────────────────────────

    #[test]
    fn test_finish_args_negations_map_to_prefixed_tokens() {
        let model = PermissionModel::from_finish_args(&[
            "--socket=wayland",
            "--nosocket=x11",
            "--unshare=ipc",
            "--nodevice=dri",
        ]);

        assert!(model.contains(SOCKET, "wayland"));
        assert!(model.contains(SOCKET, "!x11"));
        assert!(model.contains(SHARE, "!ipc"));
        assert!(model.contains(DEVICE, "!dri"));
        assert_eq!(model.negations(SOCKET).collect::<Vec<_>>(), vec!["x11"]);
        assert_eq!(model.grants(SOCKET).collect::<Vec<_>>(), vec!["wayland"]);
    }

    #[test]
    fn test_finish_args_keeps_x11_with_fallback() {
        let model = PermissionModel::from_finish_args(&["--socket=x11", "--socket=fallback-x11"]);
        assert!(model.contains(SOCKET, "x11"));
        assert!(model.contains(SOCKET, "fallback-x11"));
    }

    #[test]
    fn test_finish_args_unknown_keys_pass_through() {
        let model = PermissionModel::from_finish_args(&[
            "--require-version=1.0",
            "--env=GTK_THEME=Adwaita",
            "--talk-name=org.example.Service",
            "not-a-flag",
            "--socket",
        ]);
        assert!(model.contains("require-version", "1.0"));
        assert!(model.contains(ENV, "GTK_THEME=Adwaita"));
        assert!(model.contains(TALK_NAME, "org.example.Service"));
        assert_eq!(model.categories().count(), 3);
    }

    // ── Metadata path ────────────────────────────────────────────────────────

    #[test]
    fn test_metadata_renames_plural_categories() {
        let record = metadata(&[
            ("Context", "shared", "network;ipc;"),
            ("Context", "sockets", "wayland;pulseaudio;"),
            ("Context", "filesystems", "xdg-download;!home;"),
            ("Context", "devices", "dri;"),
            ("Context", "features", "bluetooth;"),
        ]);
        let model = PermissionModel::from_metadata(&record);

        assert!(model.contains(SHARE, "ipc"));
        assert!(model.contains(SOCKET, "pulseaudio"));
        assert!(model.contains(FILESYSTEM, "!home"));
        assert!(model.contains(DEVICE, "dri"));
        assert!(model.contains("allow", "bluetooth"));
        assert_eq!(
            model.categories().collect::<Vec<_>>(),
            vec!["allow", "device", "filesystem", "share", "socket"]
        );
    }

    #[test]
    fn test_metadata_bus_policy_becomes_level_categories() {
        let record = metadata(&[
            ("Session Bus Policy", "org.freedesktop.Notifications", "talk"),
            ("Session Bus Policy", "org.mpris.MediaPlayer2.App", "own"),
            ("System Bus Policy", "org.freedesktop.UPower", "talk"),
        ]);
        let model = PermissionModel::from_metadata(&record);

        assert!(model.contains(TALK_NAME, "org.freedesktop.Notifications"));
        assert!(model.contains(OWN_NAME, "org.mpris.MediaPlayer2.App"));
        assert!(model.contains(SYSTEM_TALK_NAME, "org.freedesktop.UPower"));
    }

    #[test]
    fn test_metadata_drops_x11_when_fallback_present() {
        let record = metadata(&[("Context", "sockets", "x11;fallback-x11;wayland;")]);
        let model = PermissionModel::from_metadata(&record);
        assert!(!model.contains(SOCKET, "x11"));
        assert!(model.contains(SOCKET, "fallback-x11"));
    }

    // ── Equivalence ──────────────────────────────────────────────────────────

    #[test]
    fn test_manifest_and_metadata_forms_are_equivalent() {
        let manifest = PermissionModel::from_finish_args(&[
            "--share=network",
            "--unshare=ipc",
            "--socket=wayland",
            "--socket=fallback-x11",
            "--device=dri",
            "--filesystem=xdg-music:ro",
            "--nofilesystem=home",
            "--talk-name=org.freedesktop.Notifications",
            "--own-name=org.mpris.MediaPlayer2.Player",
            "--system-talk-name=org.freedesktop.login1",
            "--env=FOO=bar",
            "--allow=devel",
        ]);
        let record = metadata(&[
            ("Context", "shared", "network;!ipc;"),
            ("Context", "sockets", "wayland;fallback-x11;"),
            ("Context", "devices", "dri;"),
            ("Context", "filesystems", "xdg-music:ro;!home;"),
            ("Context", "features", "devel;"),
            ("Session Bus Policy", "org.freedesktop.Notifications", "talk"),
            ("Session Bus Policy", "org.mpris.MediaPlayer2.Player", "own"),
            ("System Bus Policy", "org.freedesktop.login1", "talk"),
            ("Environment", "FOO", "bar"),
        ]);

        assert_eq!(manifest, PermissionModel::from_metadata(&record));
    }

    #[test]
    fn test_empty_model() {
        let model = PermissionModel::from_finish_args::<&str>(&[]);
        assert!(model.is_empty());
        assert_eq!(model.tokens(SOCKET).count(), 0);
    }
}
