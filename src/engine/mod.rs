// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dispatcher;
mod router;
mod stage;
mod worker;

pub mod workload;

#[cfg(test)]
mod integration_tests;

pub use stage::{Stage, StageContext};
pub use workload::WorkloadProcessor;
