// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory knowledge graph store.
//!
//! Nodes, relations and the running context integral live behind a single
//! `RwLock`, so a mutation and its integral update are one atomic step and
//! readers observe either the state before it or after it.
//!
//! The integral is maintained incrementally: each relation adds its own
//! contribution, making `add_relation` O(1) amortized. Contributions are
//! summed in relation insertion order, the same order
//! [`GraphStore::recompute_integral`] uses, so both paths produce the same
//! floating point value.

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use archive_core::domain::archive_config::GraphConfig;
use archive_core::domain::events::GraphEvent;
use archive_core::domain::ids::{IdGenerator, RandomIdGenerator};
use archive_core::infrastructure::event_bus::EventBus;

use crate::domain::errors::{in_unit_range, GraphError};
use crate::domain::graph::{KnowledgeNode, NodeId, NodeRelation, NodeType};

/// Consistent point-in-time copy of the whole graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<KnowledgeNode>,
    pub relations: Vec<NodeRelation>,
    pub context_integral: f64,
}

#[derive(Default, Clone)]
struct GraphState {
    /// Insertion order.
    nodes: Vec<KnowledgeNode>,
    index: HashMap<NodeId, usize>,
    relations: Vec<NodeRelation>,
    integral: f64,
}

impl GraphState {
    fn energy_of(&self, id: &NodeId) -> Option<f64> {
        self.index.get(id).map(|&i| self.nodes[i].energy)
    }

    fn insert_node(&mut self, node: KnowledgeNode) -> Result<GraphEvent, GraphError> {
        if !in_unit_range(node.energy) {
            return Err(GraphError::InvalidEnergy {
                node_id: node.id.clone(),
                energy: node.energy,
            });
        }
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }

        let event = GraphEvent::NodeAdded {
            node_id: node.id.to_string(),
            node_type: node.node_type.to_string(),
            energy: node.energy,
            context_integral: self.integral,
            added_at: Utc::now(),
        };
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(event)
    }

    fn insert_relation(
        &mut self,
        relation: NodeRelation,
        allow_self_loops: bool,
    ) -> Result<GraphEvent, GraphError> {
        let source_energy = self
            .energy_of(&relation.source)
            .ok_or_else(|| GraphError::UnknownNode(relation.source.clone()))?;
        let target_energy = self
            .energy_of(&relation.target)
            .ok_or_else(|| GraphError::UnknownNode(relation.target.clone()))?;

        if !in_unit_range(relation.weight) {
            return Err(GraphError::InvalidWeight {
                weight: relation.weight,
            });
        }
        if relation.is_self_loop() && !allow_self_loops {
            return Err(GraphError::SelfLoop(relation.source.clone()));
        }

        let contribution = relation.contribution(source_energy, target_energy);
        self.integral += contribution;

        let event = GraphEvent::RelationAdded {
            source: relation.source.to_string(),
            target: relation.target.to_string(),
            relation_type: relation.relation_type.clone(),
            weight: relation.weight,
            bidirectional: relation.bidirectional,
            contribution,
            context_integral: self.integral,
            added_at: Utc::now(),
        };
        self.relations.push(relation);
        Ok(event)
    }

    fn record_gauges(&self) {
        metrics::gauge!("archive_graph_nodes").set(self.nodes.len() as f64);
        metrics::gauge!("archive_graph_relations").set(self.relations.len() as f64);
        metrics::gauge!("archive_context_integral").set(self.integral);
    }

    fn full_integral(&self) -> f64 {
        self.relations.iter().fold(0.0, |sum, relation| {
            let source = self.energy_of(&relation.source).unwrap_or(0.0);
            let target = self.energy_of(&relation.target).unwrap_or(0.0);
            sum + relation.contribution(source, target)
        })
    }
}

pub struct GraphStore {
    state: RwLock<GraphState>,
    allow_self_loops: bool,
    ids: Arc<dyn IdGenerator>,
    event_bus: Option<EventBus>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_config(&GraphConfig::default())
    }

    pub fn with_config(config: &GraphConfig) -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            allow_self_loops: config.allow_self_loops,
            ids: Arc::new(RandomIdGenerator),
            event_bus: None,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Insert a node. Nodes carry no relations yet, so the integral is
    /// unchanged by the insert itself.
    pub fn add_node(&self, node: KnowledgeNode) -> Result<(), GraphError> {
        let event = {
            let mut state = self.state.write();
            let event = state.insert_node(node)?;
            state.record_gauges();
            event
        };

        if let GraphEvent::NodeAdded { node_id, node_type, energy, .. } = &event {
            info!(node_id = %node_id, node_type = %node_type, energy, "Node added to knowledge graph");
        }
        self.publish(event);
        Ok(())
    }

    /// Mint an id and identity stamp, then insert the node.
    pub fn create_node(
        &self,
        node_type: NodeType,
        label: impl Into<String>,
        energy: f64,
    ) -> Result<NodeId, GraphError> {
        let id = NodeId(self.ids.next_label("node"));
        let node = KnowledgeNode::new(id.clone(), node_type, label, energy, self.ids.next_uuid());
        self.add_node(node)?;
        Ok(id)
    }

    /// Insert a relation and fold its contribution into the integral.
    pub fn add_relation(&self, relation: NodeRelation) -> Result<(), GraphError> {
        let event = {
            let mut state = self.state.write();
            let event = state.insert_relation(relation, self.allow_self_loops)?;
            state.record_gauges();
            event
        };

        if let GraphEvent::RelationAdded { source, target, contribution, context_integral, .. } = &event {
            info!(
                source = %source,
                target = %target,
                contribution,
                context_integral,
                "Relation added to knowledge graph"
            );
        }
        self.publish(event);
        Ok(())
    }

    /// Insert nodes, then relations, as one all-or-nothing step. The batch is
    /// applied to a copy of the graph and swapped in only if every element
    /// is accepted, so a rejected batch leaves the store untouched.
    pub fn insert_batch(
        &self,
        nodes: Vec<KnowledgeNode>,
        relations: Vec<NodeRelation>,
    ) -> Result<(), GraphError> {
        let (events, integral) = {
            let mut state = self.state.write();
            let mut staged = state.clone();
            let mut events = Vec::with_capacity(nodes.len() + relations.len());

            for node in nodes {
                events.push(staged.insert_node(node)?);
            }
            for relation in relations {
                events.push(staged.insert_relation(relation, self.allow_self_loops)?);
            }

            *state = staged;
            state.record_gauges();
            (events, state.integral)
        };

        info!(elements = events.len(), context_integral = integral, "Batch added to knowledge graph");
        for event in events {
            self.publish(event);
        }
        Ok(())
    }

    /// Change a node's energy. Every relation touching the node changes its
    /// contribution, so the integral is recomputed in full under the lock.
    /// Returns the previous energy.
    pub fn set_energy(&self, id: &NodeId, energy: f64) -> Result<f64, GraphError> {
        if !in_unit_range(energy) {
            return Err(GraphError::InvalidEnergy {
                node_id: id.clone(),
                energy,
            });
        }

        let (old_energy, integral) = {
            let mut state = self.state.write();
            let position = *state
                .index
                .get(id)
                .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;

            let old_energy = std::mem::replace(&mut state.nodes[position].energy, energy);
            state.integral = state.full_integral();

            metrics::gauge!("archive_context_integral").set(state.integral);
            (old_energy, state.integral)
        };

        debug!(node_id = %id, old_energy, new_energy = energy, "Node energy updated");
        self.publish(GraphEvent::EnergyUpdated {
            node_id: id.to_string(),
            old_energy,
            new_energy: energy,
            context_integral: integral,
            updated_at: Utc::now(),
        });
        Ok(old_energy)
    }

    /// Current context integral (the incrementally maintained value).
    pub fn context_integral(&self) -> f64 {
        self.state.read().integral
    }

    /// Recompute the integral from scratch and store it. Returns the fresh
    /// value; a mismatch with the running sum is logged.
    pub fn recompute_integral(&self) -> f64 {
        let (value, drift) = {
            let mut state = self.state.write();
            let value = state.full_integral();
            let drift = value - state.integral;
            state.integral = value;
            (value, drift)
        };

        if drift != 0.0 {
            warn!(drift, "Context integral drifted from full recompute");
        }
        self.publish(GraphEvent::IntegralRecomputed {
            value,
            drift,
            recomputed_at: Utc::now(),
        });
        value
    }

    /// All nodes in insertion order
    pub fn get_all_nodes(&self) -> Vec<KnowledgeNode> {
        self.state.read().nodes.clone()
    }

    /// All relations in insertion order
    pub fn get_all_relations(&self) -> Vec<NodeRelation> {
        self.state.read().relations.clone()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<KnowledgeNode> {
        let state = self.state.read();
        state.index.get(id).map(|&i| state.nodes[i].clone())
    }

    /// Relations with `id` as either endpoint, in insertion order
    pub fn relations_of(&self, id: &NodeId) -> Vec<NodeRelation> {
        self.state
            .read()
            .relations
            .iter()
            .filter(|relation| relation.touches(id))
            .cloned()
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.state.read().relations.len()
    }

    /// Nodes, relations and integral read under one lock
    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read();
        GraphSnapshot {
            nodes: state.nodes.clone(),
            relations: state.relations.clone(),
            context_integral: state.integral,
        }
    }

    fn publish(&self, event: GraphEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_graph_event(event);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::domain::ids::SequentialIdGenerator;
    use archive_core::infrastructure::event_bus::DomainEvent;
    use uuid::Uuid;

    fn node(id: &str, energy: f64) -> KnowledgeNode {
        KnowledgeNode::new(id, NodeType::Concept, id.to_uppercase(), energy, Uuid::nil())
    }

    #[test]
    fn test_bidirectional_relation_scenario() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();
        store.add_node(node("b", 0.8)).unwrap();
        store
            .add_relation(NodeRelation::new("a", "b", "resonates", 0.6, true))
            .unwrap();

        assert!((store.context_integral() - 0.48).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_target_leaves_graph_unchanged() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();

        let err = store
            .add_relation(NodeRelation::new("a", "missing", "knows", 0.5, false))
            .unwrap_err();

        assert_eq!(err, GraphError::UnknownNode(NodeId::from("missing")));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.relation_count(), 0);
        assert_eq!(store.context_integral(), 0.0);
    }

    #[test]
    fn test_out_of_range_energy_is_rejected() {
        let store = GraphStore::new();
        let err = store.add_node(node("hot", 1.5)).unwrap_err();

        assert!(matches!(err, GraphError::InvalidEnergy { energy, .. } if energy == 1.5));
        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_nan_energy_is_rejected() {
        let store = GraphStore::new();
        assert!(matches!(
            store.add_node(node("nan", f64::NAN)),
            Err(GraphError::InvalidEnergy { .. })
        ));
    }

    #[test]
    fn test_duplicate_id_keeps_original_node() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();

        let err = store.add_node(node("a", 0.9)).unwrap_err();

        assert_eq!(err, GraphError::DuplicateId(NodeId::from("a")));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.get_node(&NodeId::from("a")).unwrap().energy, 0.5);
    }

    #[test]
    fn test_unknown_node_is_reported_before_invalid_weight() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();

        let err = store
            .add_relation(NodeRelation::new("ghost", "a", "haunts", 7.0, false))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownNode(NodeId::from("ghost")));
    }

    #[test]
    fn test_invalid_weight_is_rejected() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();
        store.add_node(node("b", 0.5)).unwrap();

        let err = store
            .add_relation(NodeRelation::new("a", "b", "knows", -0.1, false))
            .unwrap_err();

        assert!(matches!(err, GraphError::InvalidWeight { .. }));
        assert_eq!(store.relation_count(), 0);
    }

    #[test]
    fn test_self_loop_policy() {
        let strict = GraphStore::new();
        strict.add_node(node("a", 0.5)).unwrap();
        assert_eq!(
            strict.add_relation(NodeRelation::new("a", "a", "reflects", 1.0, false)),
            Err(GraphError::SelfLoop(NodeId::from("a")))
        );

        let lenient = GraphStore::with_config(&GraphConfig {
            allow_self_loops: true,
        });
        lenient.add_node(node("a", 0.5)).unwrap();
        lenient
            .add_relation(NodeRelation::new("a", "a", "reflects", 1.0, true))
            .unwrap();
        assert!((lenient.context_integral() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_set_energy_recomputes_integral() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();
        store.add_node(node("b", 0.5)).unwrap();
        store
            .add_relation(NodeRelation::new("a", "b", "knows", 1.0, false))
            .unwrap();
        assert!((store.context_integral() - 0.25).abs() < 1e-12);

        let old = store.set_energy(&NodeId::from("a"), 1.0).unwrap();

        assert_eq!(old, 0.5);
        assert!((store.context_integral() - 0.5).abs() < 1e-12);
        assert_eq!(store.context_integral(), store.recompute_integral());
    }

    #[test]
    fn test_set_energy_validates() {
        let store = GraphStore::new();
        store.add_node(node("a", 0.5)).unwrap();

        assert!(store.set_energy(&NodeId::from("a"), 2.0).is_err());
        assert!(matches!(
            store.set_energy(&NodeId::from("zz"), 0.2),
            Err(GraphError::UnknownNode(_))
        ));
        assert_eq!(store.get_node(&NodeId::from("a")).unwrap().energy, 0.5);
    }

    #[test]
    fn test_create_node_uses_injected_ids() {
        let store = GraphStore::new().with_id_generator(Arc::new(SequentialIdGenerator::new()));

        let first = store.create_node(NodeType::Character, "Aria", 0.9).unwrap();
        let second = store.create_node(NodeType::Location, "Spire", 0.4).unwrap();

        assert_eq!(first, NodeId::from("node-1"));
        assert_eq!(second, NodeId::from("node-3"));
        assert_eq!(
            store.get_node(&first).unwrap().identity_stamp,
            Uuid::from_u128(2)
        );
    }

    #[test]
    fn test_listing_preserves_insertion_order() {
        let store = GraphStore::new();
        for id in ["z", "a", "m"] {
            store.add_node(node(id, 0.3)).unwrap();
        }
        store.add_relation(NodeRelation::new("m", "z", "r1", 0.1, false)).unwrap();
        store.add_relation(NodeRelation::new("a", "m", "r2", 0.2, false)).unwrap();

        let ids: Vec<_> = store.get_all_nodes().into_iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);

        let kinds: Vec<_> = store
            .get_all_relations()
            .into_iter()
            .map(|r| r.relation_type)
            .collect();
        assert_eq!(kinds, vec!["r1", "r2"]);

        assert_eq!(store.relations_of(&NodeId::from("m")).len(), 2);
        assert_eq!(store.relations_of(&NodeId::from("a")).len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let bus = EventBus::new(16);
        let mut receiver = bus.subscribe();
        let store = GraphStore::new().with_event_bus(bus);

        store.add_node(node("a", 1.0)).unwrap();
        store.add_node(node("b", 1.0)).unwrap();
        store.add_relation(NodeRelation::new("a", "b", "knows", 0.5, false)).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(receiver.recv().await.unwrap());
        }

        match &seen[2] {
            DomainEvent::Graph(GraphEvent::RelationAdded { contribution, context_integral, .. }) => {
                assert!((contribution - 0.5).abs() < 1e-12);
                assert!((context_integral - 0.5).abs() < 1e-12);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }
}
