// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use super::task::{Subtask, SubtaskResult};

pub const CONSENSUS_STRATEGY: &str = "confidence_weighted_average";

/// Aggregate outcome of a task's subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    /// `Σ(confidence·result_weight) / Σ(confidence)`, always in `[0, 1]`.
    pub consensus_confidence: f64,
    /// Resolved partial results joined in decomposition order.
    pub synthesized_result: String,
    /// Subtask whose result scored highest; earlier subtasks win ties.
    pub lead_subtask: usize,
    pub contributing: usize,
    pub unresolved: usize,
    pub strategy: String,
}

/// Confidence-weighted consensus over the resolved subtasks.
///
/// Returns `None` when nothing resolved or every confidence is zero; the
/// weighted average is undefined in both cases.
pub fn compute_consensus(subtasks: &[Subtask]) -> Option<Consensus> {
    let resolved: Vec<(&Subtask, &SubtaskResult)> = subtasks
        .iter()
        .filter_map(|subtask| subtask.outcome.result().map(|result| (subtask, result)))
        .collect();

    let total_confidence: f64 = resolved.iter().map(|(_, r)| r.confidence).sum();
    if resolved.is_empty() || total_confidence <= 0.0 {
        return None;
    }

    let weighted: f64 = resolved
        .iter()
        .map(|(_, r)| r.confidence * r.result_weight)
        .sum();

    let mut lead = resolved[0];
    for candidate in &resolved[1..] {
        if score(candidate.1) > score(lead.1) {
            lead = *candidate;
        }
    }

    let synthesized_result = resolved
        .iter()
        .map(|(subtask, result)| format!("[{}] {}", subtask.specialty, result.summary))
        .collect::<Vec<_>>()
        .join("\n");

    Some(Consensus {
        consensus_confidence: (weighted / total_confidence).clamp(0.0, 1.0),
        synthesized_result,
        lead_subtask: lead.0.index,
        contributing: resolved.len(),
        unresolved: subtasks.len() - resolved.len(),
        strategy: CONSENSUS_STRATEGY.to_string(),
    })
}

fn score(result: &SubtaskResult) -> f64 {
    result.confidence * result.result_weight
}
