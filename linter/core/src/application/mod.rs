// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod checks;
pub mod linter;

pub use checks::{AppIdCheck, Check, FinishArgsCheck};
pub use linter::Linter;
