// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Pure linting rules and the contracts of their collaborators.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer

pub mod appid;
pub mod diagnostics;
pub mod exceptions;
pub mod finish_args;
pub mod input;
pub mod lint_config;
pub mod permissions;
pub mod provenance;
pub mod sources;
