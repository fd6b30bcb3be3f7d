// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::StageId;

/// Errors that can occur during pipeline configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The configuration declares no stages at all
    EmptyPipeline,
    /// Two stage entries claim the same id
    DuplicateStageId {
        /// The duplicate stage id
        stage: StageId,
    },
    /// A stage id falls outside the contiguous `0..stage_count` space
    StageIdOutOfRange {
        /// The offending stage id
        stage: StageId,
        /// Number of stages declared
        stage_count: usize,
    },
    /// The pipeline declares more stages than the deterministic port space
    /// can address
    TooManyStages {
        /// Number of stages declared
        stage_count: usize,
        /// The supported maximum
        max: usize,
    },
    /// A stage is configured with zero worker threads
    NoWorkers {
        /// The stage with no workers
        stage: StageId,
    },
    /// A route has no hops
    EmptyRoute {
        /// Index of the empty route
        route_id: usize,
    },
    /// A route hop references a stage that doesn't exist
    UnknownRouteHop {
        /// The route containing the bad hop
        route_id: usize,
        /// Position of the bad hop within the route
        hop_index: usize,
        /// The stage id that couldn't be resolved
        stage: StageId,
    },
    /// A route hop targets the gateway stage; terminal hand-off already
    /// returns transactions there, so a gateway hop mid-route is a mistake
    GatewayRouteHop {
        /// The route containing the gateway hop
        route_id: usize,
        /// Position of the gateway hop within the route
        hop_index: usize,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyPipeline => {
                write!(f, "Pipeline declares no stages")
            }
            ValidationError::DuplicateStageId { stage } => {
                write!(f, "Duplicate stage id: {}", stage)
            }
            ValidationError::StageIdOutOfRange { stage, stage_count } => {
                write!(
                    f,
                    "Stage id {} is out of range for a pipeline of {} stages (ids must cover 0..{})",
                    stage, stage_count, stage_count
                )
            }
            ValidationError::TooManyStages { stage_count, max } => {
                write!(
                    f,
                    "Pipeline declares {} stages but deterministic addressing supports at most {}",
                    stage_count, max
                )
            }
            ValidationError::NoWorkers { stage } => {
                write!(f, "Stage {} is configured with zero workers", stage)
            }
            ValidationError::EmptyRoute { route_id } => {
                write!(f, "Route {} has no hops", route_id)
            }
            ValidationError::UnknownRouteHop {
                route_id,
                hop_index,
                stage,
            } => {
                write!(
                    f,
                    "Route {} hop {} references stage {} which does not exist",
                    route_id, hop_index, stage
                )
            }
            ValidationError::GatewayRouteHop { route_id, hop_index } => {
                write!(
                    f,
                    "Route {} hop {} targets the gateway stage; terminal hand-off returns transactions to the gateway implicitly",
                    route_id, hop_index
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors that can occur while loading a pipeline configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The configuration file is not valid YAML for the expected schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The configuration parsed but failed validation.
    #[error("configuration validation failed:\n{}", join_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}
