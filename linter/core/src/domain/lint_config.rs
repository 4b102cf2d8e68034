// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Linter Configuration Types
//
// Defines the configuration schema for finlint, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Network collaborator settings (timeouts, catalog API, offline mode)
// - Exceptions sources
// - Identifiers already known to be published

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "LintConfig";

pub const CONFIG_PATH_ENV: &str = "FINLINT_CONFIG_PATH";
pub const OFFLINE_ENV: &str = "FINLINT_OFFLINE";
pub const TIMEOUT_ENV: &str = "FINLINT_NETWORK_TIMEOUT_SECONDS";

/// Top-level Kubernetes-style linter configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "LintConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: LintConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintConfigSpec {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub exceptions: ExceptionsConfig,

    /// Identifiers treated as already published; provenance is not
    /// re-verified for them
    #[serde(default)]
    pub published_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Run provenance checks that need the network
    #[serde(default = "default_network_enabled")]
    pub enabled: bool,

    /// Upper bound for every single network attempt
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Base URL of the catalog API answering "is this id already listed"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_api: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: default_network_enabled(),
            timeout_seconds: default_timeout_seconds(),
            catalog_api: Some(default_catalog_api()),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExceptionsConfig {
    /// Local exceptions JSON file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Remote exceptions JSON document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "finlint".to_string(),
                labels: None,
            },
            spec: LintConfigSpec::default(),
        }
    }
}

impl LintConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate locations, in precedence order, excluding an explicit CLI path
    /// 1. FINLINT_CONFIG_PATH environment variable
    /// 2. ./finlint-config.yaml (working directory)
    /// 3. ~/.finlint/config.yaml (user home)
    /// 4. /etc/finlint/config.yaml (system)
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./finlint-config.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".finlint").join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/finlint/config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|path| path.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(&config_path)
                    .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", config_path, e))?
            }
            None => {
                tracing::debug!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(OFFLINE_ENV) {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: {}=true", OFFLINE_ENV);
                    self.spec.network.enabled = false;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: {}=false", OFFLINE_ENV);
                    self.spec.network.enabled = true;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        OFFLINE_ENV,
                        val
                    );
                }
            }
        }

        if let Some(val) = lookup(TIMEOUT_ENV) {
            match val.parse::<u64>() {
                Ok(seconds) => {
                    tracing::info!("Environment override: {}={}", TIMEOUT_ENV, seconds);
                    self.spec.network.timeout_seconds = seconds;
                }
                Err(_) => tracing::warn!("Invalid value for {}: '{}'. Ignoring.", TIMEOUT_ENV, val),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.network.timeout_seconds == 0 {
            anyhow::bail!("spec.network.timeout_seconds must be greater than zero");
        }

        if let Some(api) = &self.spec.network.catalog_api {
            url::Url::parse(api)
                .map_err(|e| anyhow::anyhow!("spec.network.catalog_api is not a valid URL: {}", e))?;
        }

        if let Some(exceptions_url) = &self.spec.exceptions.url {
            url::Url::parse(exceptions_url)
                .map_err(|e| anyhow::anyhow!("spec.exceptions.url is not a valid URL: {}", e))?;
        }

        if self.spec.published_ids.iter().any(String::is_empty) {
            anyhow::bail!("spec.published_ids cannot contain empty identifiers");
        }

        Ok(())
    }
}

fn default_network_enabled() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_catalog_api() -> String {
    "https://flathub.org/api/v2".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LintConfig::default();
        assert_eq!(config.api_version, API_VERSION);
        assert_eq!(config.kind, KIND);
        assert!(config.spec.network.enabled);
        assert_eq!(config.spec.network.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: 100monkeys.ai/v1
kind: LintConfig
metadata:
  name: ci
"#;
        let config = LintConfig::from_yaml_str(yaml).unwrap();
        assert!(config.spec.network.enabled);
        assert_eq!(config.spec.network.timeout_seconds, 10);
        assert!(config.spec.published_ids.is_empty());
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
apiVersion: 100monkeys.ai/v1
kind: LintConfig
metadata:
  name: ci
spec:
  network:
    enabled: false
    timeout_seconds: 3
  exceptions:
    path: /etc/finlint/exceptions.json
  published_ids:
    - org.example.Legacy
"#;
        let config = LintConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.spec.network.enabled);
        assert_eq!(config.spec.network.timeout_seconds, 3);
        assert!(config.spec.network.catalog_api.is_none());
        assert_eq!(
            config.spec.exceptions.path.as_deref(),
            Some(Path::new("/etc/finlint/exceptions.json"))
        );
        assert_eq!(config.spec.published_ids, vec!["org.example.Legacy"]);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LintConfig::default();
        config.apply_overrides_from(|key| match key {
            OFFLINE_ENV => Some("yes".to_string()),
            TIMEOUT_ENV => Some("4".to_string()),
            _ => None,
        });
        assert!(!config.spec.network.enabled);
        assert_eq!(config.spec.network.timeout_seconds, 4);

        config.apply_overrides_from(|key| match key {
            OFFLINE_ENV => Some("maybe".to_string()),
            TIMEOUT_ENV => Some("soon".to_string()),
            _ => None,
        });
        assert!(!config.spec.network.enabled);
        assert_eq!(config.spec.network.timeout_seconds, 4);
    }

    #[test]
    fn test_validation() {
        let mut config = LintConfig::default();

        config.api_version = "wrong/v1".to_string();
        assert!(config.validate().is_err());
        config.api_version = API_VERSION.to_string();

        config.kind = "NodeConfig".to_string();
        assert!(config.validate().is_err());
        config.kind = KIND.to_string();

        config.spec.network.timeout_seconds = 0;
        assert!(config.validate().is_err());
        config.spec.network.timeout_seconds = 10;

        config.spec.exceptions.url = Some("not a url".to_string());
        assert!(config.validate().is_err());
        config.spec.exceptions.url = None;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let result = LintConfig::load_or_default(Some(PathBuf::from("/nonexistent/finlint.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = LintConfig::default();
        config.spec.published_ids.push("org.example.App".to_string());
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = LintConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded.spec.published_ids, vec!["org.example.App"]);
        assert_eq!(loaded.spec.network.catalog_api, config.spec.network.catalog_api);
    }
}
