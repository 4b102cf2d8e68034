// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use finlint_core::domain::lint_config::{LintConfig, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./finlint-config.yaml)
        #[arg(short, long, default_value = "./finlint-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = LintConfig::load_or_default(config_override.clone()).context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./finlint-config.yaml");
        println!("  4. ~/.finlint/config.yaml");
        println!("  5. /etc/finlint/config.yaml");
        if let Some(found) = LintConfig::discover_config() {
            println!("  {} {}", "using:".green(), found.display());
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    let network = &config.spec.network;
    println!("{}", "Network:".bold());
    println!("  Enabled: {}", network.enabled);
    println!("  Timeout: {}s", network.timeout_seconds);
    println!(
        "  Catalog API: {}",
        network.catalog_api.as_deref().unwrap_or("(none)")
    );
    println!();

    let exceptions = &config.spec.exceptions;
    println!("{}", "Exceptions:".bold());
    match &exceptions.path {
        Some(path) => println!("  File: {}", path.display()),
        None => println!("  File: {}", "(none)".dimmed()),
    }
    println!("  URL: {}", exceptions.url.as_deref().unwrap_or("(none)"));
    println!();

    println!("{}", "Published IDs:".bold());
    if config.spec.published_ids.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for id in &config.spec.published_ids {
        println!("  - {}", id);
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    eprintln!("Validating configuration...");

    let config = LintConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample).with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_templates_are_valid_configs() {
        for sample in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = finlint_core::domain::lint_config::LintConfig::from_yaml_str(sample).unwrap();
            config.validate().unwrap();
        }
    }
}
