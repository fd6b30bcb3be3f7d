// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod routes;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, PipelineConfig, StageConfig, WorkloadConfig,
};
pub use routes::{NextHop, RouteTable, StageId};
pub use validation::validate_pipeline_config;
