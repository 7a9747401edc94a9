// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Agents
//!
//! - [`LlmAgent`] - a specialist in the fixed roster.
//! - [`AgentStatus`] - the per-agent state machine.
//! - [`AgentSpec`] - roster entry used to build the pool.

use serde::{Deserialize, Serialize};
use std::fmt;

use archive_core::domain::ids::AgentId;

/// Agent state. Legal moves are `Idle → Thinking → Working → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Working,
}

impl AgentStatus {
    /// The next state in the cycle.
    pub fn next(self) -> AgentStatus {
        match self {
            AgentStatus::Idle => AgentStatus::Thinking,
            AgentStatus::Thinking => AgentStatus::Working,
            AgentStatus::Working => AgentStatus::Idle,
        }
    }

    pub fn is_busy(self) -> bool {
        !matches!(self, AgentStatus::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Thinking => "thinking",
            AgentStatus::Working => "working",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated specialist agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAgent {
    pub id: AgentId,
    pub name: String,
    /// Domain tag matched against subtask specialties.
    pub specialty: String,
    pub status: AgentStatus,
    /// Confidence reported for the agent's most recent contribution.
    pub confidence: f64,
}

/// Roster entry. `confidence` falls back to the pool's default seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            specialty: specialty.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_cycle() {
        let mut status = AgentStatus::Idle;
        let mut seen = Vec::new();
        for _ in 0..3 {
            status = status.next();
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![AgentStatus::Thinking, AgentStatus::Working, AgentStatus::Idle]
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AgentStatus::Thinking).unwrap(), "\"thinking\"");
        assert!(AgentStatus::Working.is_busy());
        assert!(!AgentStatus::Idle.is_busy());
    }
}
