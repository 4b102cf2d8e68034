// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # finlint CLI
//!
//! The `finlint` binary lints sandboxed application builds.
//!
//! ## Commands
//!
//! - `finlint check PATH` - Lint a manifest, build directory or repository
//! - `finlint config show|validate|generate` - Configuration management
//!
//! Diagnostics are printed as JSON on stdout; logs and status lines go to
//! stderr. Exit status: 0 no errors, 1 errors found, 2 the input could not
//! be linted.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use finlint_cli::commands::{self, CheckCommand, ConfigCommand};

const FAILURE_STATUS: u8 = 2;

/// Sandbox permission and application id linter
#[derive(Parser)]
#[command(name = "finlint")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "FINLINT_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FINLINT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint one input
    #[command(name = "check")]
    Check {
        #[command(flatten)]
        command: CheckCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        return ExitCode::from(FAILURE_STATUS);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            ExitCode::from(FAILURE_STATUS)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Check { command }) => commands::check::execute(command, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            Ok(ExitCode::from(FAILURE_STATUS))
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
