// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Pool
//!
//! Owns the fixed roster and each agent's status. All transitions and
//! snapshot reads go through one lock, so observers never see an agent
//! half-updated and the status counts always add up to the roster size.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, error};

use archive_core::domain::ids::{AgentId, IdGenerator, TaskId};

use crate::domain::agent::{AgentSpec, AgentStatus, LlmAgent};
use crate::domain::errors::SwarmError;

/// Point-in-time view of the swarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub agents: Vec<LlmAgent>,
    pub total_agents: usize,
    pub idle: usize,
    pub thinking: usize,
    pub working: usize,
    /// Tasks that reached consensus since the pool was created.
    pub total_processed: u64,
}

/// An agent handed out by [`AgentPool::acquire`]. Holds a copy of the agent
/// as it was at acquisition time.
#[derive(Debug, Clone)]
pub struct Acquired {
    pub agent: LlmAgent,
    pub specialty_match: bool,
}

struct PoolState {
    agents: Vec<LlmAgent>,
    index: HashMap<AgentId, usize>,
    owners: HashMap<AgentId, TaskId>,
    total_processed: u64,
}

impl PoolState {
    fn position(&self, agent_id: AgentId) -> Result<usize, SwarmError> {
        self.index
            .get(&agent_id)
            .copied()
            .ok_or(SwarmError::UnknownAgent(agent_id))
    }

    fn count(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }

    /// Best idle agent: highest confidence, lowest roster index on ties.
    fn pick_idle(&self, filter: impl Fn(&LlmAgent) -> bool) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, agent) in self.agents.iter().enumerate() {
            if agent.status != AgentStatus::Idle || !filter(agent) {
                continue;
            }
            match best {
                Some(b) if self.agents[b].confidence >= agent.confidence => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Exact specialty first, then any idle agent. Agents in `avoid` are
    /// only chosen when nobody else is idle.
    fn choose(&self, hint: &str, avoid: &[AgentId]) -> Option<(usize, bool)> {
        let preferred = self
            .pick_idle(|a| a.specialty == hint && !avoid.contains(&a.id))
            .map(|p| (p, true))
            .or_else(|| self.pick_idle(|a| !avoid.contains(&a.id)).map(|p| (p, false)));
        if preferred.is_some() || avoid.is_empty() {
            return preferred;
        }
        self.choose(hint, &[])
    }

    fn record_gauges(&self) {
        for status in [AgentStatus::Idle, AgentStatus::Thinking, AgentStatus::Working] {
            metrics::gauge!("archive_swarm_agents", "status" => status.as_str())
                .set(self.count(status) as f64);
        }
    }
}

pub struct AgentPool {
    state: RwLock<PoolState>,
    released: Notify,
}

impl AgentPool {
    /// Build the roster. Agents start `idle` with their seed confidence.
    pub fn new(
        roster: Vec<AgentSpec>,
        ids: &dyn IdGenerator,
        default_confidence: f64,
    ) -> Result<Self, SwarmError> {
        if roster.is_empty() {
            return Err(SwarmError::EmptyRoster);
        }

        let mut agents = Vec::with_capacity(roster.len());
        let mut index = HashMap::with_capacity(roster.len());

        for spec in roster {
            let confidence = spec.confidence.unwrap_or(default_confidence);
            if !(0.0..=1.0).contains(&confidence) {
                return Err(SwarmError::InvalidConfidence(confidence));
            }

            let agent = LlmAgent {
                id: ids.next_agent_id(),
                name: spec.name,
                specialty: spec.specialty,
                status: AgentStatus::Idle,
                confidence,
            };
            index.insert(agent.id, agents.len());
            agents.push(agent);
        }

        let state = PoolState {
            agents,
            index,
            owners: HashMap::new(),
            total_processed: 0,
        };
        state.record_gauges();

        Ok(Self {
            state: RwLock::new(state),
            released: Notify::new(),
        })
    }

    /// Hand an idle agent to `owner`, preferring an exact specialty match.
    /// The agent moves to `thinking`.
    pub fn acquire(&self, owner: TaskId, specialty_hint: &str) -> Result<Acquired, SwarmError> {
        self.acquire_avoiding(owner, specialty_hint, &[])
    }

    /// Like [`acquire`](Self::acquire), but passes over the agents in `avoid`
    /// unless they are the only idle ones. Used to pick a substitute after a
    /// stall.
    pub fn acquire_avoiding(
        &self,
        owner: TaskId,
        specialty_hint: &str,
        avoid: &[AgentId],
    ) -> Result<Acquired, SwarmError> {
        let mut state = self.state.write();

        let (position, specialty_match) = state
            .choose(specialty_hint, avoid)
            .ok_or(SwarmError::PoolExhausted)?;

        let agent = &mut state.agents[position];
        agent.status = agent.status.next();
        let agent = agent.clone();

        state.owners.insert(agent.id, owner);
        state.record_gauges();

        debug!(
            agent_id = %agent.id,
            agent = %agent.name,
            task_id = %owner,
            specialty_match,
            "Agent acquired"
        );
        Ok(Acquired {
            agent,
            specialty_match,
        })
    }

    /// `thinking → working`
    pub fn begin_work(&self, agent_id: AgentId) -> Result<(), SwarmError> {
        let mut state = self.state.write();
        let position = state.position(agent_id)?;
        advance(&mut state.agents[position], AgentStatus::Thinking)?;
        state.record_gauges();

        debug!(agent_id = %agent_id, "Agent working");
        Ok(())
    }

    /// `working → idle`, recording the reported confidence.
    pub fn release(&self, agent_id: AgentId, confidence: f64) -> Result<(), SwarmError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SwarmError::InvalidConfidence(confidence));
        }

        {
            let mut state = self.state.write();
            let position = state.position(agent_id)?;
            let agent = &mut state.agents[position];
            advance(agent, AgentStatus::Working)?;
            agent.confidence = confidence;

            state.owners.remove(&agent_id);
            state.record_gauges();
        }

        debug!(agent_id = %agent_id, confidence, "Agent released");
        self.released.notify_waiters();
        Ok(())
    }

    /// Return a `thinking` or `working` agent to `idle` without recording a
    /// confidence. Used when a task is cancelled or an agent stalls.
    /// Returns the status the agent was in.
    pub fn abandon(&self, agent_id: AgentId) -> Result<AgentStatus, SwarmError> {
        let previous = {
            let mut state = self.state.write();
            let position = state.position(agent_id)?;
            let agent = &mut state.agents[position];
            let previous = agent.status;

            if !previous.is_busy() {
                error!(agent_id = %agent_id, "Attempted to abandon an idle agent");
                return Err(SwarmError::InvalidTransition {
                    agent_id,
                    from: previous,
                    to: AgentStatus::Idle,
                });
            }

            agent.status = AgentStatus::Idle;
            state.owners.remove(&agent_id);
            state.record_gauges();
            previous
        };

        debug!(agent_id = %agent_id, from = %previous, "Agent abandoned");
        self.released.notify_waiters();
        Ok(previous)
    }

    /// Credit one processed task.
    pub fn increment_processed(&self) -> u64 {
        let mut state = self.state.write();
        state.total_processed += 1;
        state.total_processed
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.read();
        PoolSnapshot {
            agents: state.agents.clone(),
            total_agents: state.agents.len(),
            idle: state.count(AgentStatus::Idle),
            thinking: state.count(AgentStatus::Thinking),
            working: state.count(AgentStatus::Working),
            total_processed: state.total_processed,
        }
    }

    pub fn agents(&self) -> Vec<LlmAgent> {
        self.state.read().agents.clone()
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<LlmAgent> {
        let state = self.state.read();
        state.index.get(&agent_id).map(|&i| state.agents[i].clone())
    }

    /// Task currently owning the agent, if it is busy.
    pub fn owner_of(&self, agent_id: AgentId) -> Option<TaskId> {
        self.state.read().owners.get(&agent_id).copied()
    }

    pub fn idle_count(&self) -> usize {
        self.state.read().count(AgentStatus::Idle)
    }

    pub fn len(&self) -> usize {
        self.state.read().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves on the next `release` or `abandon`.
    pub fn released(&self) -> Notified<'_> {
        self.released.notified()
    }
}

/// Move `agent` one step along the cycle, provided it is currently `from`.
fn advance(agent: &mut LlmAgent, from: AgentStatus) -> Result<(), SwarmError> {
    let to = from.next();
    if agent.status != from {
        error!(
            agent_id = %agent.id,
            status = %agent.status,
            requested = %to,
            "Invalid agent transition"
        );
        return Err(SwarmError::InvalidTransition {
            agent_id: agent.id,
            from: agent.status,
            to,
        });
    }
    agent.status = to;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::domain::ids::SequentialIdGenerator;
    use uuid::Uuid;

    fn task(n: u128) -> TaskId {
        TaskId(Uuid::from_u128(1_000 + n))
    }

    fn pool(roster: Vec<AgentSpec>) -> AgentPool {
        AgentPool::new(roster, &SequentialIdGenerator::new(), 0.5).unwrap()
    }

    #[test]
    fn test_acquire_prefers_specialty_match() {
        let pool = pool(vec![
            AgentSpec::new("Sage", "lore-keeping").with_confidence(0.9),
            AgentSpec::new("Quill", "dialogue").with_confidence(0.4),
        ]);

        let acquired = pool.acquire(task(1), "dialogue").unwrap();

        assert_eq!(acquired.agent.name, "Quill");
        assert!(acquired.specialty_match);
        assert_eq!(acquired.agent.status, AgentStatus::Thinking);
    }

    #[test]
    fn test_acquire_falls_back_to_most_confident_idle_agent() {
        let pool = pool(vec![
            AgentSpec::new("Low", "research").with_confidence(0.3),
            AgentSpec::new("High", "continuity").with_confidence(0.8),
            AgentSpec::new("AlsoHigh", "continuity").with_confidence(0.8),
        ]);

        let acquired = pool.acquire(task(1), "dialogue").unwrap();

        assert_eq!(acquired.agent.name, "High");
        assert!(!acquired.specialty_match);
    }

    #[test]
    fn test_acquire_avoiding_prefers_other_agents() {
        let pool = pool(vec![
            AgentSpec::new("Stalled", "dialogue").with_confidence(0.9),
            AgentSpec::new("Backup", "dialogue").with_confidence(0.5),
        ]);
        let stalled = pool.agents()[0].id;

        let substitute = pool.acquire_avoiding(task(1), "dialogue", &[stalled]).unwrap();
        assert_eq!(substitute.agent.name, "Backup");
        assert!(substitute.specialty_match);

        // Only the avoided agent is left, so it is reused.
        let reused = pool.acquire_avoiding(task(2), "dialogue", &[stalled]).unwrap();
        assert_eq!(reused.agent.id, stalled);
    }

    #[test]
    fn test_exhausted_pool() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis")]);
        pool.acquire(task(1), "synthesis").unwrap();

        assert_eq!(pool.acquire(task(2), "synthesis").unwrap_err(), SwarmError::PoolExhausted);
    }

    #[test]
    fn test_full_cycle_records_confidence() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis")]);
        let agent_id = pool.acquire(task(1), "synthesis").unwrap().agent.id;
        assert_eq!(pool.owner_of(agent_id), Some(task(1)));

        pool.begin_work(agent_id).unwrap();
        assert_eq!(pool.agent(agent_id).unwrap().status, AgentStatus::Working);

        pool.release(agent_id, 0.92).unwrap();

        let agent = pool.agent(agent_id).unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.confidence, 0.92);
        assert_eq!(pool.owner_of(agent_id), None);
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis")]);
        let agent_id = pool.agents()[0].id;

        assert!(matches!(
            pool.begin_work(agent_id),
            Err(SwarmError::InvalidTransition { from: AgentStatus::Idle, .. })
        ));
        assert!(matches!(
            pool.release(agent_id, 0.5),
            Err(SwarmError::InvalidTransition { from: AgentStatus::Idle, .. })
        ));

        pool.acquire(task(1), "synthesis").unwrap();
        assert!(matches!(
            pool.release(agent_id, 0.5),
            Err(SwarmError::InvalidTransition { from: AgentStatus::Thinking, .. })
        ));
        assert_eq!(pool.agent(agent_id).unwrap().status, AgentStatus::Thinking);
    }

    #[test]
    fn test_release_validates_confidence() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis")]);
        let agent_id = pool.acquire(task(1), "synthesis").unwrap().agent.id;
        pool.begin_work(agent_id).unwrap();

        assert_eq!(pool.release(agent_id, 1.5), Err(SwarmError::InvalidConfidence(1.5)));
        assert_eq!(pool.agent(agent_id).unwrap().status, AgentStatus::Working);
    }

    #[test]
    fn test_abandon_returns_agent_without_crediting() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis").with_confidence(0.6)]);
        let agent_id = pool.acquire(task(1), "synthesis").unwrap().agent.id;
        pool.begin_work(agent_id).unwrap();

        assert_eq!(pool.abandon(agent_id), Ok(AgentStatus::Working));

        let agent = pool.agent(agent_id).unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.confidence, 0.6);
        assert!(pool.abandon(agent_id).is_err());
    }

    #[test]
    fn test_snapshot_counts_add_up() {
        let pool = pool((0..6).map(|i| AgentSpec::new(format!("A{}", i), "research")).collect());
        let first = pool.acquire(task(1), "research").unwrap().agent.id;
        pool.acquire(task(2), "research").unwrap();
        pool.begin_work(first).unwrap();

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.idle, 4);
        assert_eq!(snapshot.thinking, 1);
        assert_eq!(snapshot.working, 1);
        assert_eq!(snapshot.idle + snapshot.thinking + snapshot.working, snapshot.total_agents);
        assert_eq!(snapshot.total_processed, 0);

        pool.increment_processed();
        assert_eq!(pool.snapshot().total_processed, 1);
    }

    #[test]
    fn test_roster_validation() {
        let ids = SequentialIdGenerator::new();
        assert!(matches!(AgentPool::new(vec![], &ids, 0.5), Err(SwarmError::EmptyRoster)));
        assert!(matches!(
            AgentPool::new(vec![AgentSpec::new("X", "y").with_confidence(2.0)], &ids, 0.5),
            Err(SwarmError::InvalidConfidence(_))
        ));
    }

    #[test]
    fn test_unknown_agent() {
        let pool = pool(vec![AgentSpec::new("Solo", "synthesis")]);
        let stranger = AgentId(Uuid::from_u128(999_999));
        assert_eq!(pool.begin_work(stranger), Err(SwarmError::UnknownAgent(stranger)));
    }
}
