// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Sandbox manifest linter core: permission normalization, application id
//! validation and provenance, finish-args policy, and check dispatch.
//!
//! # Architecture
//!
//! - **Layer:** Core System

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
