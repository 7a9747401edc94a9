// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `archive-core` - Shared Kernel for the Living Archive
//!
//! Types shared by the knowledge graph engine (`archive-cortex`) and the swarm
//! orchestrator (`archive-swarm`).
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentId`, `TaskId`, `IdGenerator`, domain events, `ArchiveConfig` |
//! | [`infrastructure`] | Infrastructure | in-process `EventBus` |

pub mod domain;
pub mod infrastructure;

pub use domain::*;
