// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for finlint CLI

pub mod check;
pub mod config;

pub use self::check::CheckCommand;
pub use self::config::ConfigCommand;
