// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::Deserialize;

use crate::config::consts::DEFAULT_BASE_PORT;
use crate::config::{RouteTable, StageId};
use crate::errors::ConfigError;

/// Main configuration structure for one pipeline deployment.
///
/// This struct is the read-only shared state every stage process consumes:
/// how many stages exist, where each listens, how each is provisioned, and
/// which routes transactions may follow. It is published once by the
/// configuration collaborator before any stage starts and never mutated at
/// runtime.
///
/// # Fields
/// * `base_port` - Deterministic addressing base; stage `i` listens on `base_port + i`
/// * `stages` - Per-stage provisioning, one entry per stage id (0 is the gateway)
/// * `routes` - The route table, indexed by route id
///
/// # Example
/// ```yaml
/// base_port: 9000
/// stages:
///   - id: 0
///     workers: 1
///   - id: 1
///     workers: 4
///     workload:
///       memory_mb: 2
///       sleep_ns: 500000
///       compute: 7919
///   - id: 2
///     workers: 2
/// routes:
///   - [1, 2]
///   - [2, 1]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub routes: RouteTable,
}

fn default_base_port() -> u16 {
    DEFAULT_BASE_PORT
}

impl PipelineConfig {
    /// Total number of stages in the pipeline.
    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    /// Look up one stage's configuration by id.
    pub fn stage(&self, stage_id: StageId) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// The deterministic listening address for a stage: loopback at
    /// `base_port + stage_id`. This is the entire service-discovery
    /// mechanism; there is no dynamic registry.
    pub fn listen_addr(&self, stage_id: StageId) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.base_port + stage_id as u16))
    }
}

/// Configuration for a single stage in the pipeline.
///
/// # Fields
/// * `id` - Unique stage id; ids must cover `0..stages.len()` contiguously
/// * `workers` - Worker threads processing transactions on this stage
/// * `workload` - Simulated workload applied per transaction (autoscaling experiments)
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub id: StageId,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub workload: WorkloadConfig,
}

fn default_workers() -> usize {
    1
}

/// Simulated per-transaction workload parameters.
///
/// Synthetic load generators for controlled autoscaling experiments, not
/// real business logic. Each knob defaults to zero, meaning "skip".
///
/// # Fields
/// * `memory_mb` - Touch a freshly allocated block of this many megabytes
/// * `sleep_ns` - Suspend processing for this many nanoseconds
/// * `compute` - Run a bounded trial-division loop up to `√compute` iterations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub memory_mb: u32,
    #[serde(default)]
    pub sleep_ns: u64,
    #[serde(default)]
    pub compute: u32,
}

impl WorkloadConfig {
    /// True when every knob is zero and the workload is a no-op.
    pub fn is_noop(&self) -> bool {
        self.memory_mb == 0 && self.sleep_ns == 0 && self.compute == 0
    }
}

/// Load a pipeline config from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate a pipeline config from a YAML file.
///
/// This function loads the configuration and validates stage ids, worker
/// counts, and every route hop before any of it reaches a running stage.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_pipeline_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
