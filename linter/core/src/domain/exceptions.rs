// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Exceptions
//!
//! Reviewed, per-application waivers for specific diagnostic codes. The
//! table maps an identifier (or `*` for every identifier) to the codes it is
//! allowed to violate, each with a free-text reason.

use crate::domain::diagnostics::Diagnostics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exceptions {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Exceptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, appid: impl Into<String>, code: impl Into<String>, reason: impl Into<String>) {
        self.entries
            .entry(appid.into())
            .or_default()
            .insert(code.into(), reason.into());
    }

    /// Union another table into this one; entries from `other` win on
    /// conflicting reasons.
    pub fn extend(&mut self, other: Exceptions) {
        for (appid, codes) in other.entries {
            self.entries.entry(appid).or_default().extend(codes);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reason recorded for `code` under `appid`, falling back to the wildcard
    pub fn reason(&self, appid: &str, code: &str) -> Option<&str> {
        [appid, WILDCARD]
            .iter()
            .filter_map(|key| self.entries.get(*key))
            .find_map(|codes| codes.get(code))
            .map(String::as_str)
    }

    /// Drop excepted codes from errors and warnings. Info is left untouched.
    pub fn apply(&self, appid: &str, diagnostics: &mut Diagnostics) {
        let before = diagnostics.errors.len() + diagnostics.warnings.len();

        diagnostics.errors.retain(|code| self.reason(appid, code).is_none());
        diagnostics.warnings.retain(|code| self.reason(appid, code).is_none());

        let removed = before - diagnostics.errors.len() - diagnostics.warnings.len();
        if removed > 0 {
            tracing::info!(appid = %appid, removed, "Applied exceptions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostics() -> Diagnostics {
        let mut d = Diagnostics::new();
        d.error("finish-args-arbitrary-dbus-access");
        d.error("appid-domain-not-registered");
        d.warning("finish-args-deprecated-shm");
        d.info("appid-provenance-check-skipped");
        d
    }

    #[test]
    fn test_apply_removes_matching_codes() {
        let mut exceptions = Exceptions::new();
        exceptions.insert("org.foo.App", "finish-args-arbitrary-dbus-access", "needs ibus");

        let mut d = diagnostics();
        exceptions.apply("org.foo.App", &mut d);

        assert!(!d.errors.contains("finish-args-arbitrary-dbus-access"));
        assert!(d.errors.contains("appid-domain-not-registered"));
    }

    #[test]
    fn test_apply_only_for_matching_appid() {
        let mut exceptions = Exceptions::new();
        exceptions.insert("org.other.App", "finish-args-arbitrary-dbus-access", "");

        let mut d = diagnostics();
        exceptions.apply("org.foo.App", &mut d);
        assert_eq!(d, diagnostics());
    }

    #[test]
    fn test_wildcard_applies_to_everyone() {
        let mut exceptions = Exceptions::new();
        exceptions.insert(WILDCARD, "finish-args-deprecated-shm", "tolerated everywhere");

        let mut d = diagnostics();
        exceptions.apply("org.any.App", &mut d);
        assert!(d.warnings.is_empty());
        assert_eq!(d.info.len(), 1);
    }

    #[test]
    fn test_deserialize_table() {
        let json = r#"{ "org.foo.App": { "appid-domain-not-registered": "legacy id" } }"#;
        let exceptions: Exceptions = serde_json::from_str(json).unwrap();
        assert_eq!(
            exceptions.reason("org.foo.App", "appid-domain-not-registered"),
            Some("legacy id")
        );
        assert_eq!(exceptions.reason("org.foo.App", "other"), None);
    }

    #[test]
    fn test_extend_merges_codes() {
        let mut base = Exceptions::new();
        base.insert("org.foo.App", "a", "first");
        let mut extra = Exceptions::new();
        extra.insert("org.foo.App", "b", "second");

        base.extend(extra);
        assert!(base.reason("org.foo.App", "a").is_some());
        assert!(base.reason("org.foo.App", "b").is_some());
    }
}
