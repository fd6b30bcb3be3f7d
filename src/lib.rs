// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // pipeline config + route table
pub mod engine;        // per-stage execution engine
pub mod errors;        // error handling
pub mod observability;
pub mod store;         // shared transaction storage
pub mod traits;        // unified abstractions
pub mod transport;     // full-mesh stage transport
