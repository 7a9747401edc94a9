// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure domain types for agents and tasks. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `LlmAgent`, `AgentStatus`, `AgentSpec` |
//! | [`task`] | `Task`, `Subtask`, `SubtaskSpec`, `SubtaskOutcome`, `TaskStatus` |
//! | [`consensus`] | `Consensus`, `compute_consensus` |
//! | [`errors`] | `SwarmError` |

pub mod agent;
pub mod task;
pub mod consensus;
pub mod errors;

pub use agent::*;
pub use task::*;
pub use consensus::*;
pub use errors::*;
