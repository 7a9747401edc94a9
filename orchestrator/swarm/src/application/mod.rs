// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer of the swarm.
//!
//! | Module | Contents |
//! |---|---|
//! | [`agent_pool`] | Fixed roster, status transitions, snapshots |
//! | [`decomposer`] | Query → ordered subtasks |
//! | [`worker`] | Pluggable think/work behaviour for agents |
//! | [`orchestrator`] | Task lifecycle, queueing, consensus |

pub mod agent_pool;
pub mod decomposer;
pub mod orchestrator;
pub mod worker;

pub use agent_pool::{Acquired, AgentPool, PoolSnapshot};
pub use decomposer::{KeywordDecomposer, QueryDecomposer, DEFAULT_SPECIALTY, SPECIALTIES};
pub use orchestrator::{OrchestratorPolicy, TaskOrchestrator};
pub use worker::{AgentWorker, Scorer, SimulatedWorker, SpecialtyScorer, WorkOutput};
