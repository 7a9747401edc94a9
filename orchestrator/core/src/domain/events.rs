// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the knowledge graph and swarm bounded contexts.
//!
//! Events are a push-style complement to the snapshot accessors. They are
//! published after the state change they describe has been committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{AgentId, TaskId};

/// Knowledge graph events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    NodeAdded {
        node_id: String,
        node_type: String,
        energy: f64,
        context_integral: f64,
        added_at: DateTime<Utc>,
    },
    RelationAdded {
        source: String,
        target: String,
        relation_type: String,
        weight: f64,
        bidirectional: bool,
        /// Amount the relation added to the context integral.
        contribution: f64,
        context_integral: f64,
        added_at: DateTime<Utc>,
    },
    EnergyUpdated {
        node_id: String,
        old_energy: f64,
        new_energy: f64,
        context_integral: f64,
        updated_at: DateTime<Utc>,
    },
    IntegralRecomputed {
        value: f64,
        /// Difference between the running sum and the full recompute.
        drift: f64,
        recomputed_at: DateTime<Utc>,
    },
}

/// Swarm task lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwarmEvent {
    TaskSubmitted {
        task_id: TaskId,
        query: String,
        subtask_count: usize,
        submitted_at: DateTime<Utc>,
    },
    SubtaskQueued {
        task_id: TaskId,
        subtask_index: usize,
        specialty: String,
        queued_at: DateTime<Utc>,
    },
    AgentAssigned {
        task_id: TaskId,
        subtask_index: usize,
        agent_id: AgentId,
        specialty_match: bool,
        assigned_at: DateTime<Utc>,
    },
    SubtaskCompleted {
        task_id: TaskId,
        subtask_index: usize,
        agent_id: AgentId,
        confidence: f64,
        completed_at: DateTime<Utc>,
    },
    SubtaskUnresolved {
        task_id: TaskId,
        subtask_index: usize,
        reason: String,
        unresolved_at: DateTime<Utc>,
    },
    ConsensusReached {
        task_id: TaskId,
        consensus_confidence: f64,
        contributing: usize,
        reached_at: DateTime<Utc>,
    },
    TaskFailed {
        task_id: TaskId,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    TaskCancelled {
        task_id: TaskId,
        released_agents: usize,
        cancelled_at: DateTime<Utc>,
    },
}

impl SwarmEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            SwarmEvent::TaskSubmitted { task_id, .. }
            | SwarmEvent::SubtaskQueued { task_id, .. }
            | SwarmEvent::AgentAssigned { task_id, .. }
            | SwarmEvent::SubtaskCompleted { task_id, .. }
            | SwarmEvent::SubtaskUnresolved { task_id, .. }
            | SwarmEvent::ConsensusReached { task_id, .. }
            | SwarmEvent::TaskFailed { task_id, .. }
            | SwarmEvent::TaskCancelled { task_id, .. } => *task_id,
        }
    }

    /// Whether this event ends the task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwarmEvent::ConsensusReached { .. }
                | SwarmEvent::TaskFailed { .. }
                | SwarmEvent::TaskCancelled { .. }
        )
    }
}
