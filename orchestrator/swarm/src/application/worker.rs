// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent work.
//!
//! The orchestrator drives every acquired agent through an [`AgentWorker`]:
//! `think` while the agent is `thinking`, `work` once it is `working`. The
//! shipped [`SimulatedWorker`] sleeps and then asks a [`Scorer`] for the
//! result; tests plug in deterministic workers instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use archive_core::domain::archive_config::SwarmConfig;

use crate::domain::agent::LlmAgent;
use crate::domain::task::SubtaskSpec;

/// What an agent hands back for one subtask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOutput {
    pub confidence: f64,
    pub result_weight: f64,
    pub summary: String,
}

#[async_trait]
pub trait AgentWorker: Send + Sync {
    async fn think(&self, _agent: &LlmAgent, _subtask: &SubtaskSpec) -> anyhow::Result<()> {
        Ok(())
    }

    async fn work(&self, agent: &LlmAgent, subtask: &SubtaskSpec) -> anyhow::Result<WorkOutput>;
}

/// Pure scoring function applied by [`SimulatedWorker`].
pub trait Scorer: Send + Sync {
    fn score(&self, agent: &LlmAgent, subtask: &SubtaskSpec) -> WorkOutput;
}

/// Agents working in their own specialty are more confident and their
/// results carry full weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialtyScorer;

impl Scorer for SpecialtyScorer {
    fn score(&self, agent: &LlmAgent, subtask: &SubtaskSpec) -> WorkOutput {
        let base = agent.confidence.clamp(0.0, 1.0);
        let (confidence, result_weight) = if agent.specialty == subtask.specialty {
            ((0.5 * base + 0.5).min(1.0), 1.0)
        } else {
            (0.6 * base, 0.6)
        };

        WorkOutput {
            confidence,
            result_weight,
            summary: format!(
                "{} ({}) on \"{}\"",
                agent.name, agent.specialty, subtask.description
            ),
        }
    }
}

pub struct SimulatedWorker {
    think_delay: Duration,
    work_delay: Duration,
    scorer: Arc<dyn Scorer>,
}

impl SimulatedWorker {
    pub fn new(think_delay: Duration, work_delay: Duration) -> Self {
        Self {
            think_delay,
            work_delay,
            scorer: Arc::new(SpecialtyScorer),
        }
    }

    pub fn from_config(config: &SwarmConfig) -> Self {
        Self::new(config.think_delay, config.work_delay)
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }
}

impl Default for SimulatedWorker {
    fn default() -> Self {
        Self::from_config(&SwarmConfig::default())
    }
}

#[async_trait]
impl AgentWorker for SimulatedWorker {
    async fn think(&self, _agent: &LlmAgent, _subtask: &SubtaskSpec) -> anyhow::Result<()> {
        tokio::time::sleep(self.think_delay).await;
        Ok(())
    }

    async fn work(&self, agent: &LlmAgent, subtask: &SubtaskSpec) -> anyhow::Result<WorkOutput> {
        tokio::time::sleep(self.work_delay).await;
        Ok(self.scorer.score(agent, subtask))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentStatus;
    use archive_core::domain::ids::AgentId;
    use uuid::Uuid;

    fn agent(specialty: &str, confidence: f64) -> LlmAgent {
        LlmAgent {
            id: AgentId(Uuid::from_u128(7)),
            name: "Mira".to_string(),
            specialty: specialty.to_string(),
            status: AgentStatus::Working,
            confidence,
        }
    }

    #[test]
    fn test_specialty_match_boosts_confidence() {
        let subtask = SubtaskSpec::new("trace the bloodline", "lore-keeping");
        let output = SpecialtyScorer.score(&agent("lore-keeping", 0.6), &subtask);

        assert!((output.confidence - 0.8).abs() < 1e-12);
        assert_eq!(output.result_weight, 1.0);
        assert!(output.summary.contains("trace the bloodline"));
    }

    #[test]
    fn test_mismatch_is_discounted() {
        let subtask = SubtaskSpec::new("trace the bloodline", "lore-keeping");
        let output = SpecialtyScorer.score(&agent("dialogue", 0.5), &subtask);

        assert!((output.confidence - 0.3).abs() < 1e-12);
        assert_eq!(output.result_weight, 0.6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_worker_uses_scorer() {
        let worker = SimulatedWorker::new(Duration::from_millis(10), Duration::from_millis(20));
        let subtask = SubtaskSpec::new("draft a scene", "plot-structure");
        let agent = agent("plot-structure", 1.0);

        worker.think(&agent, &subtask).await.unwrap();
        let output = worker.work(&agent, &subtask).await.unwrap();

        assert_eq!(output.confidence, 1.0);
        assert_eq!(output.result_weight, 1.0);
    }
}
