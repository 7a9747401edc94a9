// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::time::Duration;
use thiserror::Error;

use archive_core::domain::ids::{AgentId, TaskId};

use super::agent::AgentStatus;

/// Errors that can occur during swarm coordination.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwarmError {
    #[error("Query is empty")]
    EmptyQuery,

    /// Transient; the orchestrator queues and retries.
    #[error("No idle agent available")]
    PoolExhausted,

    #[error("No idle agent became available within {0:?}")]
    AcquireTimeout(Duration),

    /// State machine misuse. A logic error, not a user-facing condition.
    #[error("Agent {agent_id} cannot move from {from} to {to}")]
    InvalidTransition {
        agent_id: AgentId,
        from: AgentStatus,
        to: AgentStatus,
    },

    #[error("Unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error("Unknown task {0}")]
    UnknownTask(TaskId),

    #[error("Confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    #[error("Agent roster is empty")]
    EmptyRoster,
}
