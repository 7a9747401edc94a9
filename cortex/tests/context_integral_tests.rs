// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the context integral.
//!
//! Covers the incremental/full recompute agreement, monotonic growth under
//! relation inserts, and atomicity of mutations under concurrent readers.

use archive_cortex::{GraphError, GraphStore, KnowledgeNode, NodeId, NodeRelation, NodeType};
use std::sync::Arc;
use std::thread;
use uuid::Uuid;

fn node(id: &str, energy: f64) -> KnowledgeNode {
    KnowledgeNode::new(id, NodeType::Character, id, energy, Uuid::nil())
}

/// Small deterministic generator so the sequence is reproducible.
fn lcg(seed: &mut u64) -> f64 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    ((*seed >> 11) as f64) / ((1u64 << 53) as f64)
}

#[test]
fn test_each_relation_adds_its_own_contribution() {
    let store = GraphStore::new();
    store.add_node(node("a", 0.3)).unwrap();
    store.add_node(node("b", 0.9)).unwrap();

    let before = store.context_integral();
    store.add_relation(NodeRelation::new("a", "b", "knows", 0.7, false)).unwrap();
    let after_uni = store.context_integral();
    assert!((after_uni - before - 0.7 * 0.3 * 0.9).abs() < 1e-12);

    store.add_relation(NodeRelation::new("b", "a", "trusts", 0.4, true)).unwrap();
    let after_bi = store.context_integral();
    assert!((after_bi - after_uni - 2.0 * 0.4 * 0.9 * 0.3).abs() < 1e-12);
}

#[test]
fn test_incremental_matches_full_recompute() {
    let store = GraphStore::new();
    let mut seed = 7u64;

    for i in 0..40 {
        store.add_node(node(&format!("n{}", i), lcg(&mut seed))).unwrap();
    }

    let mut previous = store.context_integral();
    for _ in 0..300 {
        let source = format!("n{}", (lcg(&mut seed) * 40.0) as usize);
        let target = format!("n{}", (lcg(&mut seed) * 40.0) as usize);
        let relation = NodeRelation::new(
            source.as_str(),
            target.as_str(),
            "link",
            lcg(&mut seed),
            lcg(&mut seed) > 0.5,
        );

        match store.add_relation(relation) {
            Ok(()) | Err(GraphError::SelfLoop(_)) => {}
            Err(other) => panic!("Unexpected error: {}", other),
        }

        let current = store.context_integral();
        assert!(current >= previous, "integral must never decrease on insert");
        previous = current;
    }

    let incremental = store.context_integral();
    assert_eq!(incremental, store.recompute_integral());
}

#[test]
fn test_rejected_relations_leave_integral_unchanged() {
    let store = GraphStore::new();
    store.add_node(node("a", 0.5)).unwrap();
    store.add_node(node("b", 0.8)).unwrap();
    store.add_relation(NodeRelation::new("a", "b", "bond", 0.6, true)).unwrap();
    let integral = store.context_integral();

    assert!(store.add_relation(NodeRelation::new("a", "missing", "x", 0.5, false)).is_err());
    assert!(store.add_relation(NodeRelation::new("a", "b", "x", 1.01, false)).is_err());
    assert!(store.add_node(node("b", 0.1)).is_err());

    assert_eq!(store.context_integral(), integral);
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.relation_count(), 1);
    assert_eq!(store.get_node(&NodeId::from("b")).unwrap().energy, 0.8);
}

#[test]
fn test_batch_insert_applies_everything() {
    let store = GraphStore::new();

    store
        .insert_batch(
            vec![node("a", 0.5), node("b", 0.8)],
            vec![NodeRelation::new("a", "b", "knows", 0.5, true)],
        )
        .unwrap();

    assert_eq!(store.node_count(), 2);
    assert_eq!(store.relation_count(), 1);
    assert!((store.context_integral() - 2.0 * 0.5 * 0.5 * 0.8).abs() < 1e-12);
}

#[test]
fn test_rejected_batch_leaves_store_untouched() {
    let store = GraphStore::new();
    store.add_node(node("b", 0.4)).unwrap();
    let before = store.snapshot();

    // "b" is already taken, after "a" would have been inserted
    let err = store
        .insert_batch(
            vec![node("a", 0.5), node("b", 0.8)],
            vec![NodeRelation::new("a", "b", "knows", 0.5, false)],
        )
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateId(NodeId::new("b")));

    // A bad relation at the end rejects the nodes before it too
    let err = store
        .insert_batch(
            vec![node("c", 0.5)],
            vec![NodeRelation::new("c", "missing", "knows", 0.5, false)],
        )
        .unwrap_err();
    assert_eq!(err, GraphError::UnknownNode(NodeId::new("missing")));

    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_concurrent_writers_and_readers_see_consistent_sums() {
    let store = Arc::new(GraphStore::new());
    for i in 0..8 {
        store.add_node(node(&format!("n{}", i), 1.0)).unwrap();
    }

    // Every relation contributes exactly 0.5, so any consistent read is a
    // multiple of 0.5.
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for k in 0..250 {
                    let source = format!("n{}", w);
                    let target = format!("n{}", (w + 1 + k % 7) % 8);
                    store
                        .add_relation(NodeRelation::new(source.as_str(), target.as_str(), "edge", 0.5, false))
                        .unwrap_or_else(|e| panic!("writer {} failed: {}", w, e));
                }
            })
        })
        .collect();

    let reader = {
        let store = store.clone();
        thread::spawn(move || {
            for _ in 0..2000 {
                let snapshot = store.snapshot();
                let expected = snapshot.relations.len() as f64 * 0.5;
                assert_eq!(snapshot.context_integral, expected);
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(store.relation_count(), 1000);
    assert_eq!(store.context_integral(), 500.0);
    assert_eq!(store.context_integral(), store.recompute_integral());
}
