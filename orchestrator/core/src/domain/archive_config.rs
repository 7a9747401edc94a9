// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Archive Configuration Types
//
// Defines the YAML configuration for an archive process:
// - Graph rules (self-loop policy)
// - Swarm sizing, decomposition cap and the stall/timeout policy
// - Simulated worker latency
// - Event bus buffering

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ARCHIVE_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "./archive-config.yaml";

/// Top-level archive configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub graph: GraphConfig,
    pub swarm: SwarmConfig,
    /// Events buffered per subscriber before the oldest are dropped
    pub event_bus_capacity: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            swarm: SwarmConfig::default(),
            event_bus_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Permit relations whose source and target are the same node
    pub allow_self_loops: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Roster size created by the seed routine
    pub pool_size: usize,

    /// Confidence an agent starts with when the roster entry gives none
    pub default_confidence: f64,

    /// Upper bound on subtasks produced for a single query
    pub max_subtasks: usize,

    /// How long a subtask may wait in the queue for an idle agent
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,

    /// How long an agent may think and work on one subtask
    #[serde(with = "humantime_serde")]
    pub subtask_timeout: Duration,

    /// Substitute agents tried after a stall before giving up on a subtask
    pub max_substitutions: u32,

    /// Simulated "thinking" latency
    #[serde(with = "humantime_serde")]
    pub think_delay: Duration,

    /// Simulated "working" latency
    #[serde(with = "humantime_serde")]
    pub work_delay: Duration,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            pool_size: 50,
            default_confidence: 0.75,
            max_subtasks: 8,
            acquire_timeout: Duration::from_secs(60),
            subtask_timeout: Duration::from_secs(30),
            max_substitutions: 1,
            think_delay: Duration::from_millis(150),
            work_delay: Duration::from_millis(350),
        }
    }
}

impl ArchiveConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ARCHIVE_CONFIG_PATH environment variable
    /// 2. ./archive-config.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from(DEFAULT_CONFIG_FILE);
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load from an explicit path, else a discovered file, else defaults.
    /// An explicit path that cannot be read is an error.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ARCHIVE_POOL_SIZE") {
            match val.parse::<usize>() {
                Ok(size) => self.swarm.pool_size = size,
                Err(_) => tracing::warn!("Ignoring invalid ARCHIVE_POOL_SIZE: {}", val),
            }
        }

        if let Ok(val) = std::env::var("ARCHIVE_SUBTASK_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => self.swarm.subtask_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!("Ignoring invalid ARCHIVE_SUBTASK_TIMEOUT_MS: {}", val),
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let swarm = &self.swarm;

        if swarm.pool_size == 0 {
            anyhow::bail!("swarm.pool_size must be greater than 0");
        }

        if !(0.0..=1.0).contains(&swarm.default_confidence) {
            anyhow::bail!(
                "swarm.default_confidence must be within [0, 1], got {}",
                swarm.default_confidence
            );
        }

        if swarm.max_subtasks == 0 {
            anyhow::bail!("swarm.max_subtasks must be greater than 0");
        }

        if swarm.acquire_timeout.is_zero() {
            anyhow::bail!("swarm.acquire_timeout cannot be zero");
        }

        if swarm.subtask_timeout.is_zero() {
            anyhow::bail!("swarm.subtask_timeout cannot be zero");
        }

        if self.event_bus_capacity == 0 {
            anyhow::bail!("event_bus_capacity must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArchiveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.swarm.pool_size, 50);
        assert!(!config.graph.allow_self_loops);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
graph:
  allow_self_loops: true
swarm:
  pool_size: 5
  subtask_timeout: 2s
  think_delay: 10ms
"#;
        let config = ArchiveConfig::from_yaml_str(yaml).unwrap();

        assert!(config.graph.allow_self_loops);
        assert_eq!(config.swarm.pool_size, 5);
        assert_eq!(config.swarm.subtask_timeout, Duration::from_secs(2));
        assert_eq!(config.swarm.think_delay, Duration::from_millis(10));
        assert_eq!(config.swarm.max_subtasks, 8);
        assert_eq!(config.event_bus_capacity, 1000);
    }

    #[test]
    fn test_validation_rejects_empty_pool() {
        let mut config = ArchiveConfig::default();
        config.swarm.pool_size = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_validation_rejects_out_of_range_confidence() {
        let mut config = ArchiveConfig::default();
        config.swarm.default_confidence = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive-config.yaml");

        let mut config = ArchiveConfig::default();
        config.swarm.max_substitutions = 3;
        config.to_yaml_file(&path).unwrap();

        let loaded = ArchiveConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.swarm.max_substitutions, 3);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ArchiveConfig::load_or_default(Some(dir.path().join("nope.yaml")));
        assert!(result.is_err());
    }
}
