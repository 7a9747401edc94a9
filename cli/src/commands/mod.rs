// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the archive CLI

pub mod config;
pub mod graph;
pub mod query;
pub mod render;

pub use self::config::ConfigCommand;
pub use self::graph::GraphArgs;
pub use self::query::{DemoArgs, QueryArgs};
