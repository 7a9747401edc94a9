// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process archive.
//!
//! [`Archive`] owns the knowledge graph, the agent pool, the task orchestrator
//! and the event bus that connects them to observers. It replaces a shared
//! global store with one explicit object that callers hold and query.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::info;

use archive_core::domain::archive_config::ArchiveConfig;
use archive_core::domain::ids::{IdGenerator, RandomIdGenerator, TaskId};
use archive_core::infrastructure::event_bus::EventBus;
use archive_cortex::{GraphError, GraphStore, KnowledgeNode, NodeId, NodeRelation, NodeType};
use archive_swarm::{
    AgentPool, AgentSpec, AgentWorker, KeywordDecomposer, OrchestratorPolicy, SimulatedWorker,
    SwarmError, TaskOrchestrator, SPECIALTIES,
};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Initial data has already been seeded")]
    AlreadySeeded,

    #[error("The agent roster has not been seeded yet")]
    NotSeeded,

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Swarm(#[from] SwarmError),
}

/// A selected node together with every relation touching it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSelection {
    pub node: KnowledgeNode,
    pub relations: Vec<NodeRelation>,
}

struct Swarm {
    pool: Arc<AgentPool>,
    orchestrator: TaskOrchestrator,
}

pub struct Archive {
    config: ArchiveConfig,
    ids: Arc<dyn IdGenerator>,
    worker: Arc<dyn AgentWorker>,
    event_bus: EventBus,
    graph: Arc<GraphStore>,
    swarm: OnceLock<Swarm>,
    seeded: Mutex<bool>,
    selected: RwLock<Option<NodeId>>,
}

impl Archive {
    pub fn new(config: ArchiveConfig) -> Self {
        let worker = Arc::new(SimulatedWorker::from_config(&config.swarm));
        Self::with_parts(config, Arc::new(RandomIdGenerator), worker)
    }

    /// Build an archive with an injected id source and agent worker.
    pub fn with_parts(
        config: ArchiveConfig,
        ids: Arc<dyn IdGenerator>,
        worker: Arc<dyn AgentWorker>,
    ) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let graph = Arc::new(
            GraphStore::with_config(&config.graph)
                .with_id_generator(ids.clone())
                .with_event_bus(event_bus.clone()),
        );

        Self {
            config,
            ids,
            worker,
            event_bus,
            graph,
            swarm: OnceLock::new(),
            seeded: Mutex::new(false),
            selected: RwLock::new(None),
        }
    }

    /// Load configuration through the usual discovery chain and build an
    /// archive from it.
    pub fn from_config_path(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = ArchiveConfig::load_or_default(path)?;
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Populate the demonstration graph and create the agent roster.
    ///
    /// One-shot: a second call fails with [`ArchiveError::AlreadySeeded`]
    /// and changes nothing. The graph is seeded as one batch, so a failed
    /// call leaves it as it was.
    pub fn seed_initial_data(&self) -> Result<(), ArchiveError> {
        let mut seeded = self.seeded.lock();
        if *seeded {
            return Err(ArchiveError::AlreadySeeded);
        }

        // 1. Agent roster
        let roster = seed_roster(self.config.swarm.pool_size, self.config.swarm.default_confidence);
        let pool = Arc::new(AgentPool::new(
            roster,
            self.ids.as_ref(),
            self.config.swarm.default_confidence,
        )?);
        let orchestrator = TaskOrchestrator::new(pool.clone(), self.worker.clone())
            .with_decomposer(Arc::new(KeywordDecomposer::from_config(&self.config.swarm)))
            .with_id_generator(self.ids.clone())
            .with_event_bus(self.event_bus.clone())
            .with_policy(OrchestratorPolicy::from_config(&self.config.swarm));

        // 2. Demonstration graph
        seed_graph(&self.graph, self.ids.as_ref())?;

        let agents = pool.len();
        if self.swarm.set(Swarm { pool, orchestrator }).is_err() {
            return Err(ArchiveError::AlreadySeeded);
        }
        *seeded = true;

        info!(
            agents,
            nodes = self.graph.node_count(),
            relations = self.graph.relation_count(),
            context_integral = self.graph.context_integral(),
            "Initial data seeded"
        );
        Ok(())
    }

    pub fn is_seeded(&self) -> bool {
        *self.seeded.lock()
    }

    /// Mark a node as selected and return it with its relations.
    pub fn select_node(&self, id: &NodeId) -> Result<NodeSelection, ArchiveError> {
        let selection = self
            .selection_for(id)
            .ok_or_else(|| ArchiveError::UnknownNode(id.clone()))?;
        *self.selected.write() = Some(id.clone());
        Ok(selection)
    }

    /// The selected node as it is now, if any.
    pub fn selected_node(&self) -> Option<NodeSelection> {
        let id = self.selected.read().clone()?;
        self.selection_for(&id)
    }

    pub fn clear_selection(&self) {
        *self.selected.write() = None;
    }

    pub async fn submit_query(&self, text: &str) -> Result<TaskId, ArchiveError> {
        Ok(self.orchestrator()?.submit_query(text).await?)
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    pub fn pool(&self) -> Result<&Arc<AgentPool>, ArchiveError> {
        self.swarm
            .get()
            .map(|swarm| &swarm.pool)
            .ok_or(ArchiveError::NotSeeded)
    }

    pub fn orchestrator(&self) -> Result<&TaskOrchestrator, ArchiveError> {
        self.swarm
            .get()
            .map(|swarm| &swarm.orchestrator)
            .ok_or(ArchiveError::NotSeeded)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    fn selection_for(&self, id: &NodeId) -> Option<NodeSelection> {
        let node = self.graph.get_node(id)?;
        let relations = self.graph.relations_of(id);
        Some(NodeSelection { node, relations })
    }
}

/// `pool_size` agents spread round-robin over the specialties, with
/// deterministic confidences scattered around `default_confidence`.
pub fn seed_roster(pool_size: usize, default_confidence: f64) -> Vec<AgentSpec> {
    (0..pool_size)
        .map(|i| {
            let (specialty, _) = SPECIALTIES[i % SPECIALTIES.len()];
            let title = AGENT_TITLES[i % AGENT_TITLES.len()];
            let spread = ((i * 37) % 41) as f64 / 40.0 * 0.4 - 0.2;
            let confidence = ((default_confidence + spread) * 100.0).round() / 100.0;

            AgentSpec::new(format!("{} {}", title, i / SPECIALTIES.len() + 1), specialty)
                .with_confidence(confidence.clamp(0.0, 1.0))
        })
        .collect()
}

const AGENT_TITLES: [&str; 10] = [
    "Character Weaver",
    "World Smith",
    "Dialogue Scribe",
    "Plot Architect",
    "Theme Seer",
    "Lore Keeper",
    "Heart Reader",
    "Continuity Warden",
    "Research Scout",
    "Synthesist",
];

const SEED_NODES: [(&str, NodeType, &str, f64, &str); 8] = [
    ("aria", NodeType::Character, "Aria the Cartographer", 0.9, "Maps places that have not happened yet"),
    ("thorne", NodeType::Character, "Captain Thorne", 0.8, "Keeps the lighthouse of Vessel City"),
    ("vessel-city", NodeType::Location, "Vessel City", 0.7, "A city built on the hulls of beached ships"),
    ("drowned-library", NodeType::Location, "The Drowned Library", 0.6, "Shelves that surface at low tide"),
    ("memory-tide", NodeType::Concept, "The Memory Tide", 0.85, "Forgotten things wash back ashore"),
    ("cartography", NodeType::Concept, "Living Cartography", 0.55, "Maps that redraw themselves"),
    ("first-parley", NodeType::Dialogue, "The First Parley", 0.5, "Aria and Thorne agree on a truce"),
    ("the-sundering", NodeType::Event, "The Sundering", 0.75, "The night the tide took the old harbour"),
];

const SEED_RELATIONS: [(&str, &str, &str, f64, bool); 10] = [
    ("aria", "thorne", "ally_of", 0.6, true),
    ("aria", "cartography", "practises", 0.9, false),
    ("aria", "first-parley", "speaks_in", 0.7, false),
    ("thorne", "first-parley", "speaks_in", 0.7, false),
    ("thorne", "vessel-city", "guards", 0.8, false),
    ("vessel-city", "drowned-library", "borders", 0.4, true),
    ("memory-tide", "drowned-library", "floods", 0.65, false),
    ("the-sundering", "vessel-city", "reshaped", 0.85, false),
    ("the-sundering", "memory-tide", "awakened", 0.5, false),
    ("cartography", "memory-tide", "charts", 0.3, true),
];

fn seed_graph(graph: &GraphStore, ids: &dyn IdGenerator) -> Result<(), GraphError> {
    let nodes = SEED_NODES
        .iter()
        .map(|&(id, node_type, label, energy, description)| {
            KnowledgeNode::new(id, node_type, label, energy, ids.next_uuid())
                .with_property("description", json!(description))
        })
        .collect();
    let relations = SEED_RELATIONS
        .iter()
        .map(|&(source, target, relation_type, weight, bidirectional)| {
            NodeRelation::new(source, target, relation_type, weight, bidirectional)
        })
        .collect();

    graph.insert_batch(nodes, relations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::domain::ids::SequentialIdGenerator;
    use std::collections::HashMap;

    fn archive() -> Archive {
        Archive::with_parts(
            ArchiveConfig::default(),
            Arc::new(SequentialIdGenerator::new()),
            Arc::new(SimulatedWorker::new(
                std::time::Duration::ZERO,
                std::time::Duration::ZERO,
            )),
        )
    }

    #[test]
    fn test_seed_populates_graph_and_roster() {
        let archive = archive();
        assert!(matches!(archive.pool(), Err(ArchiveError::NotSeeded)));

        archive.seed_initial_data().unwrap();

        assert_eq!(archive.graph().node_count(), SEED_NODES.len());
        assert_eq!(archive.graph().relation_count(), SEED_RELATIONS.len());
        assert!(archive.graph().context_integral() > 0.0);

        let snapshot = archive.pool().unwrap().snapshot();
        assert_eq!(snapshot.total_agents, 50);
        assert_eq!(snapshot.idle, 50);
    }

    #[test]
    fn test_second_seed_is_rejected_without_changes() {
        let archive = archive();
        archive.seed_initial_data().unwrap();
        let integral = archive.graph().context_integral();

        assert!(matches!(archive.seed_initial_data(), Err(ArchiveError::AlreadySeeded)));
        assert_eq!(archive.graph().node_count(), SEED_NODES.len());
        assert_eq!(archive.graph().context_integral(), integral);
        assert_eq!(archive.pool().unwrap().len(), 50);
    }

    #[test]
    fn test_failed_seed_leaves_graph_untouched() {
        let archive = archive();
        archive
            .graph()
            .add_node(KnowledgeNode::new(
                "thorne",
                NodeType::Character,
                "Host Thorne",
                0.5,
                SequentialIdGenerator::new().next_uuid(),
            ))
            .unwrap();

        for _ in 0..2 {
            let err = archive.seed_initial_data().unwrap_err();
            assert!(matches!(
                err,
                ArchiveError::Graph(GraphError::DuplicateId(ref id)) if id.as_str() == "thorne"
            ));
            assert_eq!(archive.graph().node_count(), 1);
            assert_eq!(archive.graph().relation_count(), 0);
            assert!(!archive.is_seeded());
            assert!(matches!(archive.pool(), Err(ArchiveError::NotSeeded)));
        }
    }

    #[test]
    fn test_roster_has_five_agents_per_specialty() {
        let roster = seed_roster(50, 0.75);
        let mut per_specialty: HashMap<&str, usize> = HashMap::new();
        for spec in &roster {
            *per_specialty.entry(spec.specialty.as_str()).or_default() += 1;
            let confidence = spec.confidence.unwrap();
            assert!((0.55..=0.95).contains(&confidence), "{}", confidence);
        }

        assert_eq!(per_specialty.len(), 10);
        assert!(per_specialty.values().all(|&count| count == 5));
        assert_eq!(roster, seed_roster(50, 0.75));
    }

    #[test]
    fn test_select_node_tracks_current_state() {
        let archive = archive();
        archive.seed_initial_data().unwrap();

        let selection = archive.select_node(&NodeId::from("aria")).unwrap();
        assert_eq!(selection.node.label, "Aria the Cartographer");
        assert_eq!(selection.relations.len(), 3);

        archive
            .graph()
            .add_relation(NodeRelation::new("the-sundering", "aria", "orphaned", 0.2, false))
            .unwrap();
        assert_eq!(archive.selected_node().unwrap().relations.len(), 4);

        assert!(matches!(
            archive.select_node(&NodeId::from("nobody")),
            Err(ArchiveError::UnknownNode(_))
        ));
        assert_eq!(archive.selected_node().unwrap().node.id, NodeId::from("aria"));

        archive.clear_selection();
        assert!(archive.selected_node().is_none());
    }

    #[tokio::test]
    async fn test_query_before_seeding_is_rejected() {
        let archive = archive();
        assert!(matches!(archive.submit_query("who is Aria").await, Err(ArchiveError::NotSeeded)));
    }
}
