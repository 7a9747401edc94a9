// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Graph storage.

pub mod graph_store;

pub use graph_store::{GraphSnapshot, GraphStore};
