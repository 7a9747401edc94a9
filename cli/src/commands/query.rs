// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Swarm commands
//!
//! Commands: query, demo

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tokio::task::JoinHandle;

use archive_core::infrastructure::event_bus::{EventBus, EventBusError};
use archive_swarm::Task;

use crate::commands::render;
use crate::embedded::Archive;

const DEMO_QUERIES: [&str; 4] = [
    "Who is Aria and what drives her maps?",
    "Describe Vessel City, then trace the legend of the Sundering",
    "Check the timeline for contradictions and summarize the Memory Tide",
    "Write the conversation at the First Parley, but keep the tone tense",
];

#[derive(Args)]
pub struct QueryArgs {
    /// Query text
    #[arg(required = true, num_args = 1.., value_name = "TEXT")]
    text: Vec<String>,

    /// Print the settled task as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Queries to submit (default: a built-in set)
    #[arg(value_name = "QUERY")]
    queries: Vec<String>,

    /// Print events as they are published
    #[arg(long)]
    events: bool,

    /// List every agent after the run
    #[arg(long)]
    agents: bool,
}

pub async fn run_query(args: QueryArgs, config_override: Option<PathBuf>) -> Result<()> {
    let archive = seeded_archive(config_override)?;
    let text = args.text.join(" ");

    let task_id = archive.submit_query(&text).await?;
    let task = archive.orchestrator()?.wait_for(task_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        render::print_task(&task);
    }
    Ok(())
}

pub async fn run_demo(args: DemoArgs, config_override: Option<PathBuf>) -> Result<()> {
    let archive = seeded_archive(config_override)?;
    let printer = args.events.then(|| spawn_event_printer(archive.event_bus()));

    println!("{}", "Living Archive demo".bold());
    println!();
    render::print_integral(archive.graph().context_integral());

    let queries: Vec<String> = if args.queries.is_empty() {
        DEMO_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        args.queries
    };

    let orchestrator = archive.orchestrator()?;
    let mut task_ids = Vec::with_capacity(queries.len());
    for query in &queries {
        let task_id = archive
            .submit_query(query)
            .await
            .with_context(|| format!("Failed to submit {:?}", query))?;
        task_ids.push(task_id);
    }

    render::print_swarm(&archive.pool()?.snapshot());

    let tasks: Vec<Task> = futures::future::try_join_all(
        task_ids.into_iter().map(|task_id| orchestrator.wait_for(task_id)),
    )
    .await?;

    if let Some(printer) = printer {
        printer.abort();
        println!();
    }

    for task in &tasks {
        render::print_task(task);
    }

    let snapshot = archive.pool()?.snapshot();
    render::print_swarm(&snapshot);
    if args.agents {
        render::print_agents(&snapshot);
    }
    render::print_integral(archive.graph().context_integral());

    Ok(())
}

fn seeded_archive(config_override: Option<PathBuf>) -> Result<Archive> {
    let archive = Archive::from_config_path(config_override)
        .context("Failed to load configuration")?;
    archive
        .seed_initial_data()
        .context("Failed to seed initial data")?;
    Ok(archive)
}

fn spawn_event_printer(event_bus: &EventBus) -> JoinHandle<()> {
    let mut receiver = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => println!("  {} {}", "•".dimmed(), render::format_event(&event)),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}
