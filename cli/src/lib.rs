// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Living Archive host library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Wires the knowledge graph and the agent swarm into one
//!   in-process [`Archive`](embedded::Archive) and renders it for the CLI

pub mod commands;
pub mod embedded;

pub use embedded::{Archive, ArchiveError, NodeSelection};
