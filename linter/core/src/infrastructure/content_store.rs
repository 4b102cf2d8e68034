// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Content Store
//!
//! Repository access through the `ostree` command-line tool. Only two
//! operations are needed: listing refs, and checking out the `metadata`
//! file of one ref into a caller-owned directory.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Implements [`ContentStore`] over an external process

use crate::domain::input::LintError;
use crate::domain::sources::ContentStore;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OstreeContentStore {
    binary: String,
    timeout: Duration,
}

impl Default for OstreeContentStore {
    fn default() -> Self {
        Self {
            binary: "ostree".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OstreeContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run(&self, repo: &Path, args: &[&str]) -> Result<String, LintError> {
        let extraction = |reason: String| LintError::Extraction {
            repo: repo.to_path_buf(),
            reason,
        };

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg(format!("--repo={}", repo.display())).args(args);
        cmd.kill_on_drop(true);

        tracing::debug!(binary = %self.binary, ?args, repo = ?repo, "Running content store command");

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(Ok(output)) => Err(extraction(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
            Ok(Err(e)) => Err(extraction(format!("Failed to run {}: {}", self.binary, e))),
            Err(_) => Err(extraction(format!("{} timed out", self.binary))),
        }
    }
}

#[async_trait]
impl ContentStore for OstreeContentStore {
    async fn list_refs(&self, repo: &Path) -> Result<Vec<String>, LintError> {
        let stdout = self.run(repo, &["refs"]).await?;
        Ok(parse_refs(&stdout))
    }

    async fn checkout_metadata(&self, repo: &Path, reference: &str, dest: &Path) -> Result<(), LintError> {
        let dest = dest.to_string_lossy();
        self.run(
            repo,
            &["checkout", "--user-mode", "--union", "--subpath=/metadata", reference, &dest],
        )
        .await?;
        Ok(())
    }
}

fn parse_refs(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refs() {
        let out = "app/org.example.App/x86_64/stable\n\nruntime/org.example.App.Debug/x86_64/stable\n";
        assert_eq!(
            parse_refs(out),
            vec![
                "app/org.example.App/x86_64/stable",
                "runtime/org.example.App.Debug/x86_64/stable"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_extraction_error() {
        let store = OstreeContentStore::new().with_binary("/nonexistent/ostree");
        let result = store.list_refs(Path::new("/tmp/repo")).await;
        assert!(matches!(result, Err(LintError::Extraction { .. })));
    }
}
