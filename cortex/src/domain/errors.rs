// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

use super::graph::NodeId;

/// Errors returned by graph mutations. A failed mutation leaves the graph
/// untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Energy {energy} of node {node_id} is outside [0, 1]")]
    InvalidEnergy { node_id: NodeId, energy: f64 },

    #[error("Relation weight {weight} is outside [0, 1]")]
    InvalidWeight { weight: f64 },

    #[error("Node {0} already exists")]
    DuplicateId(NodeId),

    #[error("Relation references unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Self-loop relations are not permitted (node {0})")]
    SelfLoop(NodeId),
}

/// Whether `value` lies in the closed unit interval. NaN does not.
pub(crate) fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
