// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Core Domain Layer
//!
//! Pure types with no I/O besides configuration file loading.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`ids`] | `AgentId`, `TaskId`, `IdGenerator` |
//! | [`events`] | `GraphEvent`, `SwarmEvent` |
//! | [`archive_config`] | `ArchiveConfig`, `GraphConfig`, `SwarmConfig` |

pub mod ids;
pub mod events;
pub mod archive_config;

pub use ids::*;
pub use events::*;
pub use archive_config::*;
