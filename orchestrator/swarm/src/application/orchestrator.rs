// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Task Orchestrator
//!
//! Accepts queries, decomposes them, and runs every subtask on an agent from
//! the shared [`AgentPool`]. Tasks run concurrently on the Tokio runtime;
//! callers observe progress through [`TaskOrchestrator::task_history`],
//! [`TaskOrchestrator::wait_for`] or the [`EventBus`].
//!
//! Admission to the pool goes through a fair semaphore sized to the roster,
//! so when every agent is busy the waiting subtasks are served in the order
//! they started waiting.

use chrono::Utc;
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use archive_core::domain::archive_config::SwarmConfig;
use archive_core::domain::events::SwarmEvent;
use archive_core::domain::ids::{AgentId, IdGenerator, RandomIdGenerator, TaskId};
use archive_core::infrastructure::event_bus::EventBus;

use crate::application::agent_pool::{Acquired, AgentPool};
use crate::application::decomposer::{KeywordDecomposer, QueryDecomposer, DEFAULT_SPECIALTY};
use crate::application::worker::{AgentWorker, WorkOutput};
use crate::domain::agent::LlmAgent;
use crate::domain::consensus::compute_consensus;
use crate::domain::errors::SwarmError;
use crate::domain::task::{Subtask, SubtaskOutcome, SubtaskResult, SubtaskSpec, Task, TaskStatus};

/// Waiting and stall bounds applied to every subtask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorPolicy {
    /// Longest a subtask waits for an idle agent.
    pub acquire_timeout: Duration,
    /// Longest one agent may spend thinking and working on a subtask.
    pub subtask_timeout: Duration,
    /// Extra agents tried after a stall.
    pub max_substitutions: u32,
}

impl OrchestratorPolicy {
    pub fn from_config(config: &SwarmConfig) -> Self {
        Self {
            acquire_timeout: config.acquire_timeout,
            subtask_timeout: config.subtask_timeout,
            max_substitutions: config.max_substitutions,
        }
    }
}

impl Default for OrchestratorPolicy {
    fn default() -> Self {
        Self::from_config(&SwarmConfig::default())
    }
}

#[derive(Default)]
struct TaskHistory {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    tokens: HashMap<TaskId, CancellationToken>,
}

impl TaskHistory {
    fn get_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        let position = *self.index.get(&task_id)?;
        self.tasks.get_mut(position)
    }

    fn subtask_mut(&mut self, task_id: TaskId, index: usize) -> Option<&mut Subtask> {
        self.get_mut(task_id)?.decomposed.get_mut(index)
    }
}

enum Drive {
    Completed(WorkOutput),
    Stalled(String),
    Cancelled,
}

/// Counts a subtask as queued for as long as it is alive.
struct QueueSlot<'a>(&'a AtomicUsize);

impl<'a> QueueSlot<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct TaskOrchestrator {
    pool: Arc<AgentPool>,
    decomposer: Arc<dyn QueryDecomposer>,
    worker: Arc<dyn AgentWorker>,
    ids: Arc<dyn IdGenerator>,
    event_bus: Option<EventBus>,
    policy: OrchestratorPolicy,
    admission: Arc<Semaphore>,
    history: Arc<RwLock<TaskHistory>>,
    settled: Arc<Notify>,
    queued: Arc<AtomicUsize>,
}

impl TaskOrchestrator {
    pub fn new(pool: Arc<AgentPool>, worker: Arc<dyn AgentWorker>) -> Self {
        let admission = Arc::new(Semaphore::new(pool.len()));
        Self {
            pool,
            decomposer: Arc::new(KeywordDecomposer::default()),
            worker,
            ids: Arc::new(RandomIdGenerator),
            event_bus: None,
            policy: OrchestratorPolicy::default(),
            admission,
            history: Arc::new(RwLock::new(TaskHistory::default())),
            settled: Arc::new(Notify::new()),
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_decomposer(mut self, decomposer: Arc<dyn QueryDecomposer>) -> Self {
        self.decomposer = decomposer;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_policy(mut self, policy: OrchestratorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a task for `text` and start working it in the background.
    ///
    /// Returns as soon as the task is in the history; completion is observed
    /// through [`wait_for`](Self::wait_for), the history, or events.
    pub async fn submit_query(&self, text: &str) -> Result<TaskId, SwarmError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(SwarmError::EmptyQuery);
        }

        // 1. Decompose
        let mut specs = self.decomposer.decompose(query);
        if specs.is_empty() {
            specs.push(SubtaskSpec::new(query, DEFAULT_SPECIALTY));
        }

        // 2. Record in history
        let task_id = self.ids.next_task_id();
        let token = CancellationToken::new();
        let task = Task::new(task_id, text, specs.clone());
        let submitted_at = task.submitted_at;
        {
            let mut history = self.history.write();
            let position = history.tasks.len();
            history.index.insert(task_id, position);
            history.tasks.push(task);
            history.tokens.insert(task_id, token.clone());
        }

        info!(
            task_id = %task_id,
            subtasks = specs.len(),
            "Task submitted"
        );
        metrics::counter!("archive_tasks_submitted_total").increment(1);
        self.publish(SwarmEvent::TaskSubmitted {
            task_id,
            query: text.to_string(),
            subtask_count: specs.len(),
            submitted_at,
        });

        // 3. Run in the background
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_task(task_id, specs, token).await;
        });

        Ok(task_id)
    }

    /// Request cancellation of an open task. Agents it holds go back to
    /// `idle` without a result being credited.
    ///
    /// Returns `false` if the task had already settled.
    pub fn cancel_task(&self, task_id: TaskId) -> Result<bool, SwarmError> {
        let history = self.history.read();
        if !history.index.contains_key(&task_id) {
            return Err(SwarmError::UnknownTask(task_id));
        }

        match history.tokens.get(&task_id) {
            Some(token) => {
                info!(task_id = %task_id, "Cancelling task");
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Wait until the task is resolved, failed or cancelled.
    pub async fn wait_for(&self, task_id: TaskId) -> Result<Task, SwarmError> {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let task = self
                .get_task(task_id)
                .ok_or(SwarmError::UnknownTask(task_id))?;
            if task.status.is_terminal() {
                return Ok(task);
            }

            notified.await;
        }
    }

    /// Tasks still open, in submission order.
    pub fn active_tasks(&self) -> Vec<Task> {
        self.history
            .read()
            .tasks
            .iter()
            .filter(|task| task.is_open())
            .cloned()
            .collect()
    }

    /// Every task ever submitted, in submission order.
    pub fn task_history(&self) -> Vec<Task> {
        self.history.read().tasks.clone()
    }

    pub fn get_task(&self, task_id: TaskId) -> Option<Task> {
        let history = self.history.read();
        history
            .index
            .get(&task_id)
            .and_then(|&position| history.tasks.get(position))
            .cloned()
    }

    /// Subtasks currently waiting for an agent.
    pub fn queued_subtasks(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    pub fn policy(&self) -> OrchestratorPolicy {
        self.policy
    }

    async fn run_task(&self, task_id: TaskId, specs: Vec<SubtaskSpec>, token: CancellationToken) {
        let released_agents = AtomicUsize::new(0);

        let subtasks = specs
            .into_iter()
            .enumerate()
            .map(|(index, plan)| self.run_subtask(task_id, index, plan, &token, &released_agents));
        futures::future::join_all(subtasks).await;

        self.finalize(task_id, &token, released_agents.load(Ordering::SeqCst));
    }

    async fn run_subtask(
        &self,
        task_id: TaskId,
        index: usize,
        plan: SubtaskSpec,
        token: &CancellationToken,
        released_agents: &AtomicUsize,
    ) {
        let mut tried: Vec<AgentId> = Vec::new();

        loop {
            let admitted = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.settle_subtask(task_id, index, SubtaskOutcome::Cancelled);
                    return;
                }
                admitted = tokio::time::timeout(
                    self.policy.acquire_timeout,
                    self.admit(task_id, index, &plan, &tried),
                ) => admitted,
            };

            let (permit, acquired) = match admitted {
                Ok(Ok(admitted)) => admitted,
                Ok(Err(e)) => {
                    self.mark_unresolved(task_id, index, e.to_string());
                    return;
                }
                Err(_) => {
                    let e = SwarmError::AcquireTimeout(self.policy.acquire_timeout);
                    self.mark_unresolved(task_id, index, e.to_string());
                    return;
                }
            };

            let agent = acquired.agent;
            tried.push(agent.id);
            self.record_assignment(task_id, index, &agent, acquired.specialty_match);

            match self.drive(&agent, &plan, token).await {
                Drive::Completed(output) => {
                    self.complete(task_id, index, &agent, output);
                    return;
                }
                Drive::Cancelled => {
                    self.settle_subtask(task_id, index, SubtaskOutcome::Cancelled);
                    if self.pool.abandon(agent.id).is_ok() {
                        released_agents.fetch_add(1, Ordering::SeqCst);
                    }
                    return;
                }
                Drive::Stalled(reason) => {
                    warn!(
                        task_id = %task_id,
                        subtask = index,
                        agent_id = %agent.id,
                        reason = %reason,
                        "Agent stalled"
                    );
                    if let Some(subtask) = self.history.write().subtask_mut(task_id, index) {
                        subtask.assigned_agent = None;
                    }
                    if let Err(e) = self.pool.abandon(agent.id) {
                        error!(agent_id = %agent.id, error = %e, "Failed to return stalled agent");
                    }
                    drop(permit);

                    if tried.len() as u32 > self.policy.max_substitutions {
                        self.mark_unresolved(task_id, index, reason);
                        return;
                    }
                    metrics::counter!("archive_subtask_substitutions_total").increment(1);
                    info!(task_id = %task_id, subtask = index, "Trying substitute agent");
                }
            }
        }
    }

    /// Wait for a pool slot, then take an agent.
    async fn admit(
        &self,
        task_id: TaskId,
        index: usize,
        plan: &SubtaskSpec,
        avoid: &[AgentId],
    ) -> Result<(OwnedSemaphorePermit, Acquired), SwarmError> {
        let permit = match self.admission.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                let _slot = QueueSlot::enter(&self.queued);
                debug!(task_id = %task_id, subtask = index, "Pool exhausted, subtask queued");
                self.publish(SwarmEvent::SubtaskQueued {
                    task_id,
                    subtask_index: index,
                    specialty: plan.specialty.clone(),
                    queued_at: Utc::now(),
                });
                self.admission
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| SwarmError::PoolExhausted)?
            }
            Err(TryAcquireError::Closed) => return Err(SwarmError::PoolExhausted),
        };

        // Holding a permit normally guarantees an idle agent, but the pool
        // can be used directly, so wait for a release if it is still full.
        loop {
            let released = self.pool.released();
            tokio::pin!(released);
            released.as_mut().enable();

            match self.pool.acquire_avoiding(task_id, &plan.specialty, avoid) {
                Ok(acquired) => return Ok((permit, acquired)),
                Err(SwarmError::PoolExhausted) => released.await,
                Err(e) => return Err(e),
            }
        }
    }

    async fn drive(&self, agent: &LlmAgent, plan: &SubtaskSpec, token: &CancellationToken) -> Drive {
        let attempt = async {
            self.worker.think(agent, plan).await?;
            self.pool.begin_work(agent.id)?;
            let output = self.worker.work(agent, plan).await?;
            Ok::<_, anyhow::Error>(output)
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => Drive::Cancelled,
            outcome = tokio::time::timeout(
                self.policy.subtask_timeout,
                AssertUnwindSafe(attempt).catch_unwind(),
            ) => match outcome {
                Ok(Ok(Ok(output))) => Drive::Completed(output),
                Ok(Ok(Err(e))) => Drive::Stalled(format!("Agent failed: {e}")),
                Ok(Err(panic)) => {
                    Drive::Stalled(format!("Agent panicked: {}", panic_message(panic.as_ref())))
                }
                Err(_) => Drive::Stalled(format!(
                    "Agent did not finish within {:?}",
                    self.policy.subtask_timeout
                )),
            },
        }
    }

    fn complete(&self, task_id: TaskId, index: usize, agent: &LlmAgent, output: WorkOutput) {
        let confidence = sanitize(output.confidence, "confidence", agent.id);
        let result_weight = sanitize(output.result_weight, "result_weight", agent.id);

        // The outcome is recorded before the agent goes back to the pool so
        // the history never shows one agent on two pending subtasks.
        self.settle_subtask(
            task_id,
            index,
            SubtaskOutcome::Resolved(SubtaskResult {
                agent_id: agent.id,
                confidence,
                result_weight,
                summary: output.summary,
            }),
        );

        if let Err(e) = self.pool.release(agent.id, confidence) {
            error!(agent_id = %agent.id, error = %e, "Failed to release agent");
            if let Err(e) = self.pool.abandon(agent.id) {
                error!(agent_id = %agent.id, error = %e, "Failed to return agent after rejected release");
            }
            self.mark_unresolved(task_id, index, e.to_string());
            return;
        }

        debug!(task_id = %task_id, subtask = index, agent_id = %agent.id, confidence, "Subtask completed");
        self.publish(SwarmEvent::SubtaskCompleted {
            task_id,
            subtask_index: index,
            agent_id: agent.id,
            confidence,
            completed_at: Utc::now(),
        });
    }

    fn record_assignment(&self, task_id: TaskId, index: usize, agent: &LlmAgent, specialty_match: bool) {
        if let Some(subtask) = self.history.write().subtask_mut(task_id, index) {
            subtask.assigned_agent = Some(agent.id);
            subtask.attempts += 1;
        }

        debug!(
            task_id = %task_id,
            subtask = index,
            agent = %agent.name,
            specialty_match,
            "Agent assigned"
        );
        self.publish(SwarmEvent::AgentAssigned {
            task_id,
            subtask_index: index,
            agent_id: agent.id,
            specialty_match,
            assigned_at: Utc::now(),
        });
    }

    fn mark_unresolved(&self, task_id: TaskId, index: usize, reason: String) {
        warn!(task_id = %task_id, subtask = index, reason = %reason, "Subtask unresolved");
        metrics::counter!("archive_subtasks_unresolved_total").increment(1);

        self.settle_subtask(
            task_id,
            index,
            SubtaskOutcome::Unresolved {
                reason: reason.clone(),
            },
        );
        self.publish(SwarmEvent::SubtaskUnresolved {
            task_id,
            subtask_index: index,
            reason,
            unresolved_at: Utc::now(),
        });
    }

    fn settle_subtask(&self, task_id: TaskId, index: usize, outcome: SubtaskOutcome) {
        if let Some(subtask) = self.history.write().subtask_mut(task_id, index) {
            subtask.outcome = outcome;
        }
    }

    fn finalize(&self, task_id: TaskId, token: &CancellationToken, released_agents: usize) {
        let event = {
            let mut history = self.history.write();
            history.tokens.remove(&task_id);
            let Some(task) = history.get_mut(task_id) else {
                return;
            };
            let now = Utc::now();
            task.settled_at = Some(now);

            if token.is_cancelled() {
                task.status = TaskStatus::Cancelled;
                for subtask in task.decomposed.iter_mut() {
                    if subtask.outcome.is_pending() {
                        subtask.outcome = SubtaskOutcome::Cancelled;
                    }
                }
                info!(task_id = %task_id, released_agents, "Task cancelled");
                SwarmEvent::TaskCancelled {
                    task_id,
                    released_agents,
                    cancelled_at: now,
                }
            } else if let Some(consensus) = compute_consensus(&task.decomposed) {
                task.status = TaskStatus::Resolved;
                task.consensus = Some(consensus.clone());
                let total_processed = self.pool.increment_processed();
                metrics::counter!("archive_tasks_resolved_total").increment(1);
                info!(
                    task_id = %task_id,
                    consensus_confidence = consensus.consensus_confidence,
                    contributing = consensus.contributing,
                    total_processed,
                    "Consensus reached"
                );
                SwarmEvent::ConsensusReached {
                    task_id,
                    consensus_confidence: consensus.consensus_confidence,
                    contributing: consensus.contributing,
                    reached_at: now,
                }
            } else {
                task.status = TaskStatus::Failed;
                let reason = format!(
                    "No usable result from {} subtask(s)",
                    task.decomposed.len()
                );
                warn!(task_id = %task_id, reason = %reason, "Task failed");
                SwarmEvent::TaskFailed {
                    task_id,
                    reason,
                    failed_at: now,
                }
            }
        };

        self.publish(event);
        self.settled.notify_waiters();
    }

    fn publish(&self, event: SwarmEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_swarm_event(event);
        }
    }
}

fn sanitize(value: f64, field: &str, agent_id: AgentId) -> f64 {
    if (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    warn!(agent_id = %agent_id, field, value, clamped, "Worker output outside [0, 1]");
    clamped
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
