// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Lint command
//!
//! Resolves configuration, builds the collaborators, lints one input and
//! prints the diagnostics JSON on stdout.

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use finlint_core::application::{AppIdCheck, FinishArgsCheck, Linter};
use finlint_core::domain::diagnostics::Diagnostics;
use finlint_core::domain::exceptions::Exceptions;
use finlint_core::domain::input::{InputContext, InputKind, LintError};
use finlint_core::domain::lint_config::LintConfig;
use finlint_core::domain::provenance::ProvenanceResolver;
use finlint_core::infrastructure::exceptions_loader::ExceptionsLoader;
use finlint_core::infrastructure::{
    DnsRegistrationChecker, HttpCatalog, KeyFileMetadataReader, ManifestParser, NetworkReachability,
    OstreeContentStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Manifest,
    Builddir,
    Repo,
}

impl From<KindArg> for InputKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Manifest => InputKind::Manifest,
            KindArg::Builddir => InputKind::BuildDir,
            KindArg::Repo => InputKind::Repo,
        }
    }
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Input kind (default: inferred from the path)
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Apply the configured exceptions tables
    #[arg(long)]
    pub exceptions: bool,

    /// Additional exceptions JSON file (implies exceptions filtering)
    #[arg(long, value_name = "FILE")]
    pub user_exceptions: Option<PathBuf>,

    /// Look exceptions up under this application id
    #[arg(long, value_name = "ID")]
    pub appid: Option<String>,

    /// Skip checks that need the network
    #[arg(long)]
    pub offline: bool,

    /// Manifest file, build directory or repository
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

pub async fn execute(command: CheckCommand, config_override: Option<PathBuf>) -> Result<ExitCode> {
    let mut config = LintConfig::load_or_default(config_override).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    if command.offline {
        config.spec.network.enabled = false;
    }

    let kind = resolve_kind(command.kind, &command.path)?;
    let context = InputContext::new(kind, &command.path);

    let mut linter = build_linter(&config)?;

    if command.exceptions || command.user_exceptions.is_some() {
        let exceptions = load_exceptions(&config, command.exceptions, command.user_exceptions.as_deref()).await?;
        linter = linter.with_exceptions(exceptions);
    }
    if let Some(appid) = command.appid {
        linter = linter.with_appid_override(appid);
    }

    let diagnostics = linter
        .lint(&context)
        .await
        .with_context(|| format!("Failed to lint {} {}", context.kind(), context.path().display()))?;

    let json = serde_json::to_string_pretty(&diagnostics).context("Failed to serialize diagnostics")?;
    println!("{}", json);

    report(&diagnostics);
    Ok(ExitCode::from(exit_status(&diagnostics)))
}

fn resolve_kind(explicit: Option<KindArg>, path: &std::path::Path) -> Result<InputKind> {
    if let Some(kind) = explicit {
        return Ok(kind.into());
    }

    InputKind::infer(path).ok_or_else(|| {
        anyhow!(LintError::InvalidInput(format!(
            "cannot infer input kind of {}; pass --kind",
            path.display()
        )))
    })
}

fn build_linter(config: &LintConfig) -> Result<Linter> {
    let network = &config.spec.network;

    let appid_check = if network.enabled {
        let timeout = network.timeout();
        let reachability = NetworkReachability::new(timeout).context("Failed to create HTTP client")?;
        let registration = DnsRegistrationChecker::new(timeout).context("Failed to create HTTP client")?;
        let catalog = HttpCatalog::new(
            network.catalog_api.clone(),
            config.spec.published_ids.iter().cloned(),
            timeout,
        )
        .context("Failed to create HTTP client")?;

        AppIdCheck::new(
            ProvenanceResolver::new(Arc::new(reachability), Arc::new(registration)),
            Arc::new(catalog),
        )
    } else {
        tracing::info!("Network checks disabled");
        AppIdCheck::offline()
    };

    Ok(Linter::new(
        Arc::new(ManifestParser::new()),
        Arc::new(KeyFileMetadataReader::new()),
        Arc::new(OstreeContentStore::new()),
    )
    .with_check(Arc::new(appid_check))
    .with_check(Arc::new(FinishArgsCheck::new())))
}

async fn load_exceptions(
    config: &LintConfig,
    configured: bool,
    user_file: Option<&std::path::Path>,
) -> Result<Exceptions> {
    let mut exceptions = Exceptions::new();

    if configured {
        let sources = &config.spec.exceptions;
        if let Some(path) = &sources.path {
            exceptions.extend(ExceptionsLoader::load_file(path)?);
        }
        if let Some(url) = &sources.url {
            if config.spec.network.enabled {
                exceptions.extend(ExceptionsLoader::fetch_url(url, config.spec.network.timeout()).await?);
            } else {
                tracing::warn!(url = %url, "Network disabled, not fetching exceptions");
            }
        }
        if sources.path.is_none() && sources.url.is_none() {
            tracing::warn!("--exceptions given but no exceptions source is configured");
        }
    }

    if let Some(path) = user_file {
        exceptions.extend(ExceptionsLoader::load_file(path)?);
    }

    Ok(exceptions)
}

/// 0 when no errors remain, 1 otherwise; 2 is reserved for failures
pub fn exit_status(diagnostics: &Diagnostics) -> u8 {
    u8::from(diagnostics.has_errors())
}

fn report(diagnostics: &Diagnostics) {
    if diagnostics.has_errors() {
        eprintln!(
            "{}",
            format!(
                "✗ {} error(s), {} warning(s)",
                diagnostics.errors.len(),
                diagnostics.warnings.len()
            )
            .red()
        );
    } else if !diagnostics.warnings.is_empty() {
        eprintln!(
            "{}",
            format!("⚠ {} warning(s)", diagnostics.warnings.len()).yellow()
        );
    } else {
        eprintln!("{}", "✓ No findings".green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_kind_wins() {
        let kind = resolve_kind(Some(KindArg::Repo), std::path::Path::new("/nonexistent")).unwrap();
        assert_eq!(kind, InputKind::Repo);
    }

    #[test]
    fn test_uninferable_kind_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_kind(None, dir.path()).is_err());

        let manifest = dir.path().join("org.example.App.json");
        std::fs::write(&manifest, "{}").unwrap();
        assert_eq!(resolve_kind(None, &manifest).unwrap(), InputKind::Manifest);
    }

    #[test]
    fn test_exit_code_reflects_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("finish-args-deprecated-shm");
        assert_eq!(exit_status(&diagnostics), 0);

        diagnostics.error("appid-not-defined");
        assert_eq!(exit_status(&diagnostics), 1);
    }

    #[tokio::test]
    async fn test_user_exceptions_merge_over_configured() {
        let dir = tempfile::tempdir().unwrap();
        let configured = dir.path().join("exceptions.json");
        std::fs::write(&configured, r#"{ "*": { "finish-args-deprecated-shm": "" } }"#).unwrap();
        let user = dir.path().join("user.json");
        std::fs::write(&user, r#"{ "org.example.App": { "appid-domain-not-registered": "" } }"#).unwrap();

        let mut config = LintConfig::default();
        config.spec.exceptions.path = Some(configured);

        let exceptions = load_exceptions(&config, true, Some(&user)).await.unwrap();
        assert!(exceptions.reason("org.other.App", "finish-args-deprecated-shm").is_some());
        assert!(exceptions.reason("org.example.App", "appid-domain-not-registered").is_some());

        let user_only = load_exceptions(&config, false, Some(&user)).await.unwrap();
        assert!(user_only.reason("org.other.App", "finish-args-deprecated-shm").is_none());
    }
}
