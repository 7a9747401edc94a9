// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Tasks and Subtasks
//!
//! A [`Task`] is created for each submitted query. It is decomposed into
//! ordered [`Subtask`]s, each worked by one agent, and resolves once a
//! [`Consensus`] has been computed over the subtask results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use archive_core::domain::ids::{AgentId, TaskId};

use super::consensus::Consensus;

/// What the decomposer produces: the text of a subtask and the specialty it
/// should be matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    pub description: String,
    pub specialty: String,
}

impl SubtaskSpec {
    pub fn new(description: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            specialty: specialty.into(),
        }
    }
}

/// Partial result produced by one agent for one subtask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub agent_id: AgentId,
    /// Agent's confidence in `[0, 1]`.
    pub confidence: f64,
    /// Quality weight of the result in `[0, 1]`.
    pub result_weight: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubtaskOutcome {
    /// Queued or in progress.
    Pending,
    Resolved(SubtaskResult),
    /// Excluded from consensus.
    Unresolved { reason: String },
    Cancelled,
}

impl SubtaskOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubtaskOutcome::Pending)
    }

    pub fn result(&self) -> Option<&SubtaskResult> {
        match self {
            SubtaskOutcome::Resolved(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    /// Position in decomposition order.
    pub index: usize,
    pub description: String,
    pub specialty: String,
    /// Agent currently (or finally) responsible for the subtask.
    pub assigned_agent: Option<AgentId>,
    /// Number of agents that have been given this subtask.
    pub attempts: u32,
    pub outcome: SubtaskOutcome,
}

impl Subtask {
    pub fn new(index: usize, spec: SubtaskSpec) -> Self {
        Self {
            index,
            description: spec.description,
            specialty: spec.specialty,
            assigned_agent: None,
            attempts: 0,
            outcome: SubtaskOutcome::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Resolved,
    /// No subtask produced a usable result.
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Original query text.
    pub query: String,
    pub decomposed: Vec<Subtask>,
    pub consensus: Option<Consensus>,
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, query: impl Into<String>, specs: Vec<SubtaskSpec>) -> Self {
        Self {
            id,
            query: query.into(),
            decomposed: specs
                .into_iter()
                .enumerate()
                .map(|(index, spec)| Subtask::new(index, spec))
                .collect(),
            consensus: None,
            status: TaskStatus::Open,
            submitted_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Agents assigned to subtasks, in decomposition order.
    pub fn assigned_agents(&self) -> Vec<AgentId> {
        self.decomposed
            .iter()
            .filter_map(|subtask| subtask.assigned_agent)
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }

    pub fn unresolved_count(&self) -> usize {
        self.decomposed
            .iter()
            .filter(|subtask| matches!(subtask.outcome, SubtaskOutcome::Unresolved { .. }))
            .count()
    }
}
