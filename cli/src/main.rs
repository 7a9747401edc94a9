// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Living Archive CLI
//!
//! The `archive` binary hosts the knowledge graph and the agent swarm
//! in-process. Every command seeds a fresh archive; state lives only as
//! long as the command runs.
//!
//! ## Commands
//!
//! - `archive demo` - Seed, submit a batch of queries, report the swarm
//! - `archive query <TEXT>...` - Run one query to consensus
//! - `archive graph [--node ID]` - Print the seeded knowledge graph
//! - `archive config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use living_archive::commands::{self, ConfigCommand, DemoArgs, GraphArgs, QueryArgs};

/// Living Archive - knowledge graph and agent swarm
#[derive(Parser)]
#[command(name = "archive")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ARCHIVE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ARCHIVE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the archive and run a batch of queries through the swarm
    Demo(DemoArgs),

    /// Submit one query and wait for consensus
    Query(QueryArgs),

    /// Inspect the seeded knowledge graph
    Graph(GraphArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Demo(args)) => commands::query::run_demo(args, cli.config).await,
        Some(Commands::Query(args)) => commands::query::run_query(args, cli.config).await,
        Some(Commands::Graph(args)) => commands::graph::run(args, cli.config).await,
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
