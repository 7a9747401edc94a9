// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `archive-cortex` - Knowledge Graph Engine
//!
//! Owns the knowledge graph: typed nodes carrying an *energy* in `[0, 1]`,
//! weighted relations between them, and the **context integral**, a single
//! scalar summarising weighted, energy-scaled connectivity.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `KnowledgeNode`, `NodeRelation`, `NodeType`, `GraphError` |
//! | [`infrastructure`] | Infrastructure | `GraphStore` (in-memory, thread-safe) |

pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
