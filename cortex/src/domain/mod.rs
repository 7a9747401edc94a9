// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Knowledge graph domain types.

pub mod graph;
pub mod errors;

pub use graph::*;
pub use errors::*;
