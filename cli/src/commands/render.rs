// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering shared by the commands

use colored::Colorize;

use archive_core::domain::events::{GraphEvent, SwarmEvent};
use archive_core::infrastructure::event_bus::DomainEvent;
use archive_cortex::GraphSnapshot;
use archive_swarm::{AgentStatus, PoolSnapshot, SubtaskOutcome, Task, TaskStatus};

use crate::embedded::NodeSelection;

pub fn print_swarm(snapshot: &PoolSnapshot) {
    println!("{}", "Swarm:".bold());
    println!(
        "  {} agents: {} idle, {} thinking, {} working",
        snapshot.total_agents,
        snapshot.idle.to_string().green(),
        snapshot.thinking.to_string().yellow(),
        snapshot.working.to_string().cyan(),
    );
    println!("  Tasks processed: {}", snapshot.total_processed);
    println!();
}

pub fn print_agents(snapshot: &PoolSnapshot) {
    for agent in &snapshot.agents {
        let status = match agent.status {
            AgentStatus::Idle => agent.status.as_str().green(),
            AgentStatus::Thinking => agent.status.as_str().yellow(),
            AgentStatus::Working => agent.status.as_str().cyan(),
        };
        println!(
            "  {:<22} {:<22} {:<9} {:.2}",
            agent.name, agent.specialty, status, agent.confidence
        );
    }
    println!();
}

pub fn print_task(task: &Task) {
    let status = match task.status {
        TaskStatus::Open => "open".yellow(),
        TaskStatus::Resolved => "resolved".green(),
        TaskStatus::Failed => "failed".red(),
        TaskStatus::Cancelled => "cancelled".dimmed(),
    };
    println!("{} {} [{}]", "Task".bold(), task.id, status);
    println!("  Query: {}", task.query);

    for subtask in &task.decomposed {
        let outcome = match &subtask.outcome {
            SubtaskOutcome::Pending => "pending".yellow().to_string(),
            SubtaskOutcome::Resolved(result) => format!("confidence {:.2}", result.confidence),
            SubtaskOutcome::Unresolved { reason } => format!("unresolved: {}", reason).red().to_string(),
            SubtaskOutcome::Cancelled => "cancelled".dimmed().to_string(),
        };
        println!(
            "  {}. [{}] {} ({})",
            subtask.index + 1,
            subtask.specialty.cyan(),
            subtask.description,
            outcome
        );
    }

    if let Some(consensus) = &task.consensus {
        println!(
            "  Consensus: {} (lead subtask {}, {} contributing)",
            format!("{:.3}", consensus.consensus_confidence).bold(),
            consensus.lead_subtask + 1,
            consensus.contributing
        );
        for line in consensus.synthesized_result.lines() {
            println!("    {}", line.dimmed());
        }
    }
    println!();
}

pub fn print_graph(snapshot: &GraphSnapshot) {
    println!("{}", "Knowledge Graph:".bold());
    for node in &snapshot.nodes {
        println!(
            "  {:<18} {:<10} {:<26} energy {:.2}",
            node.id.as_str(),
            node.node_type.as_str().cyan(),
            node.label,
            node.energy
        );
    }
    println!();

    println!("{}", "Relations:".bold());
    for relation in &snapshot.relations {
        let arrow = if relation.bidirectional { "<->" } else { "->" };
        println!(
            "  {} {} {} ({}, weight {:.2})",
            relation.source, arrow, relation.target, relation.relation_type, relation.weight
        );
    }
    println!();

    print_integral(snapshot.context_integral);
}

pub fn print_integral(value: f64) {
    println!("{} {}", "Context integral:".bold(), format!("{:.4}", value).green());
    println!();
}

pub fn print_selection(selection: &NodeSelection) {
    let node = &selection.node;
    println!("{} {} ({})", "Selected:".bold(), node.label, node.node_type);
    println!("  Id: {}", node.id);
    println!("  Energy: {:.2}", node.energy);
    for (key, value) in &node.properties {
        println!("  {}: {}", key, value);
    }
    for relation in &selection.relations {
        println!(
            "  {} {} {} ({:.2})",
            relation.source, relation.relation_type, relation.target, relation.weight
        );
    }
    println!();
}

/// One line per event, for `--events`.
pub fn format_event(event: &DomainEvent) -> String {
    match event {
        DomainEvent::Graph(GraphEvent::NodeAdded { node_id, .. }) => format!("node added {}", node_id),
        DomainEvent::Graph(GraphEvent::RelationAdded { source, target, context_integral, .. }) => {
            format!("relation {} -> {} (integral {:.4})", source, target, context_integral)
        }
        DomainEvent::Graph(GraphEvent::EnergyUpdated { node_id, new_energy, .. }) => {
            format!("energy of {} set to {:.2}", node_id, new_energy)
        }
        DomainEvent::Graph(GraphEvent::IntegralRecomputed { value, drift, .. }) => {
            format!("integral recomputed {:.4} (drift {:e})", value, drift)
        }
        DomainEvent::Swarm(event) => format_swarm_event(event),
    }
}

fn format_swarm_event(event: &SwarmEvent) -> String {
    match event {
        SwarmEvent::TaskSubmitted { task_id, subtask_count, .. } => {
            format!("task {} submitted ({} subtasks)", task_id, subtask_count)
        }
        SwarmEvent::SubtaskQueued { task_id, subtask_index, .. } => {
            format!("task {} subtask {} queued", task_id, subtask_index + 1)
        }
        SwarmEvent::AgentAssigned { task_id, subtask_index, agent_id, specialty_match, .. } => format!(
            "task {} subtask {} -> agent {}{}",
            task_id,
            subtask_index + 1,
            agent_id,
            if *specialty_match { "" } else { " (generalist)" }
        ),
        SwarmEvent::SubtaskCompleted { task_id, subtask_index, confidence, .. } => format!(
            "task {} subtask {} done ({:.2})",
            task_id,
            subtask_index + 1,
            confidence
        ),
        SwarmEvent::SubtaskUnresolved { task_id, subtask_index, reason, .. } => format!(
            "task {} subtask {} unresolved: {}",
            task_id,
            subtask_index + 1,
            reason
        ),
        SwarmEvent::ConsensusReached { task_id, consensus_confidence, .. } => {
            format!("task {} consensus {:.3}", task_id, consensus_confidence)
        }
        SwarmEvent::TaskFailed { task_id, reason, .. } => format!("task {} failed: {}", task_id, reason),
        SwarmEvent::TaskCancelled { task_id, released_agents, .. } => {
            format!("task {} cancelled ({} agents released)", task_id, released_agents)
        }
    }
}
