// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Knowledge graph inspection

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use archive_cortex::NodeId;

use crate::commands::render;
use crate::embedded::Archive;

#[derive(Args)]
pub struct GraphArgs {
    /// Show one node and its relations
    #[arg(long, value_name = "ID")]
    node: Option<String>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: GraphArgs, config_override: Option<PathBuf>) -> Result<()> {
    let archive = Archive::from_config_path(config_override)
        .context("Failed to load configuration")?;
    archive
        .seed_initial_data()
        .context("Failed to seed initial data")?;

    if let Some(id) = args.node {
        let selection = archive.select_node(&NodeId::new(id))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&selection)?);
        } else {
            render::print_selection(&selection);
        }
        return Ok(());
    }

    let snapshot = archive.graph().snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        render::print_graph(&snapshot);
    }
    Ok(())
}
