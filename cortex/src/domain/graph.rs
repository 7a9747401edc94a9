// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Knowledge graph entities: nodes, relations and the per-relation share of
//! the context integral.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Node identifier. Assigned at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Classification of a node in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Character,
    Concept,
    Location,
    Dialogue,
    Event,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Character,
        NodeType::Concept,
        NodeType::Location,
        NodeType::Dialogue,
        NodeType::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Character => "character",
            NodeType::Concept => "concept",
            NodeType::Location => "location",
            NodeType::Dialogue => "dialogue",
            NodeType::Event => "event",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "character" => Ok(NodeType::Character),
            "concept" => Ok(NodeType::Concept),
            "location" => Ok(NodeType::Location),
            "dialogue" => Ok(NodeType::Dialogue),
            "event" => Ok(NodeType::Event),
            other => Err(format!("Unknown node type: {}", other)),
        }
    }
}

/// Node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub label: String,
    /// Open extension point; the engine never interprets it.
    #[serde(default)]
    pub properties: HashMap<String, Value>,
    /// Contribution weight in `[0, 1]`.
    pub energy: f64,
    /// Display/identity token. Never used as a lookup key.
    pub identity_stamp: Uuid,
}

impl KnowledgeNode {
    pub fn new(
        id: impl Into<NodeId>,
        node_type: NodeType,
        label: impl Into<String>,
        energy: f64,
        identity_stamp: Uuid,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: label.into(),
            properties: HashMap::new(),
            energy,
            identity_stamp,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Weighted relation between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRelation {
    pub source: NodeId,
    pub target: NodeId,
    /// Free-form label, e.g. `mentor_of`.
    pub relation_type: String,
    /// Strength in `[0, 1]`.
    pub weight: f64,
    pub bidirectional: bool,
}

impl NodeRelation {
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        relation_type: impl Into<String>,
        weight: f64,
        bidirectional: bool,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            weight,
            bidirectional,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// This relation's share of the context integral given the endpoint
    /// energies: `w·e_s·e_t`, counted once per direction.
    pub fn contribution(&self, source_energy: f64, target_energy: f64) -> f64 {
        let directions = if self.bidirectional { 2.0 } else { 1.0 };
        directions * self.weight * source_energy * target_energy
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}
