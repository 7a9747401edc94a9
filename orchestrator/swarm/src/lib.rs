// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `archive-swarm` - Swarm Consciousness Orchestrator
//!
//! A fixed pool of specialist agents, and the orchestrator that decomposes an
//! incoming query into subtasks, assigns agents, and merges their partial
//! results into a confidence-weighted consensus.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `LlmAgent`, `AgentStatus`, `Task`, `Subtask`, `Consensus`, `SwarmError` |
//! | [`application`] | Application | `AgentPool`, `TaskOrchestrator`, `QueryDecomposer`, `AgentWorker` |
//!
//! ## Key Concepts
//!
//! - **Agent cycle**: `idle → thinking → working → idle`. Between `acquire` and
//!   `release` an agent is owned by exactly one task.
//! - **Queueing**: when every agent is busy, subtasks wait in FIFO order for
//!   the next release instead of failing.
//! - **Stalls**: agent work is bounded by a timeout; a stalled agent is
//!   returned to `idle`, a substitute is tried, and after that the subtask is
//!   left unresolved and excluded from consensus.
//!
//! State is in memory only and lives as long as the process.

pub mod domain;
pub mod application;

pub use domain::*;
pub use application::*;
