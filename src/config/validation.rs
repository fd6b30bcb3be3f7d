// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of a pipeline configuration.
//!
//! Runs before any stage starts. Everything here is a startup-time failure:
//! a config that fails validation never reaches a running mesh.

use std::collections::HashSet;

use crate::config::consts::{GATEWAY_STAGE_ID, MAX_STAGES};
use crate::config::PipelineConfig;
use crate::errors::ValidationError;

/// Validate stage ids, worker counts, and the route table.
///
/// Collects every problem rather than stopping at the first, so an operator
/// gets the complete picture in one pass.
pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let stage_count = config.stages.len();

    if stage_count == 0 {
        errors.push(ValidationError::EmptyPipeline);
    }
    if stage_count > MAX_STAGES {
        errors.push(ValidationError::TooManyStages {
            stage_count,
            max: MAX_STAGES,
        });
    }

    let mut seen = HashSet::new();
    for stage in &config.stages {
        if !seen.insert(stage.id) {
            errors.push(ValidationError::DuplicateStageId { stage: stage.id });
        }
        if stage.id as usize >= stage_count {
            errors.push(ValidationError::StageIdOutOfRange {
                stage: stage.id,
                stage_count,
            });
        }
        if stage.workers == 0 {
            errors.push(ValidationError::NoWorkers { stage: stage.id });
        }
    }

    for (route_id, route) in config.routes.0.iter().enumerate() {
        if route.is_empty() {
            errors.push(ValidationError::EmptyRoute { route_id });
        }
        for (hop_index, hop) in route.iter().enumerate() {
            if !seen.contains(hop) {
                errors.push(ValidationError::UnknownRouteHop {
                    route_id,
                    hop_index,
                    stage: *hop,
                });
            } else if *hop == GATEWAY_STAGE_ID {
                errors.push(ValidationError::GatewayRouteHop {
                    route_id,
                    hop_index,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
