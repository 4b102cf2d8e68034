// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Loads exceptions tables from a local JSON file or a remote JSON document.

use crate::domain::exceptions::Exceptions;
use crate::domain::input::LintError;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

pub struct ExceptionsLoader;

impl ExceptionsLoader {
    pub fn parse(origin: &str, json: &str) -> Result<Exceptions, LintError> {
        serde_json::from_str(json).map_err(|e| LintError::ExceptionsLoad {
            origin: origin.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load_file(path: &Path) -> Result<Exceptions, LintError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| LintError::ExceptionsLoad {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        let exceptions = Self::parse(&origin, &content)?;
        tracing::debug!(origin = %origin, "Loaded exceptions file");
        Ok(exceptions)
    }

    pub async fn fetch_url(url: &str, timeout: Duration) -> Result<Exceptions, LintError> {
        let failed = |reason: String| LintError::ExceptionsLoad {
            origin: url.to_string(),
            reason,
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| failed(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| failed(e.to_string()))?;
        let exceptions = Self::parse(url, &body)?;
        tracing::debug!(origin = %url, "Fetched exceptions");
        Ok(exceptions)
    }
}
