// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the per-stage execution engine.
//!
//! Each engine component (dispatcher, worker, router) runs an unbounded loop
//! and returns one of these when the loop dies. A component failure is fatal
//! to that component only; the stage keeps its surviving components running
//! but is non-functional for new traffic until externally restarted.

use thiserror::Error;

use crate::config::StageId;
use crate::errors::{StoreError, TransportError};

/// Errors that terminate an engine component's loop.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The transport failed underneath the dispatcher or router.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The dispatcher could not hand a transaction to a worker because the
    /// worker's input channel receiver is gone.
    #[error("input channel for worker {worker} closed")]
    WorkerInputClosed { worker: usize },

    /// A worker's input channel sender side is gone (the dispatcher died).
    #[error("worker {worker} lost its input channel")]
    WorkerInputGone { worker: usize },

    /// A worker could not forward a processed transaction because the router
    /// dropped its output channel.
    #[error("output channel for worker {worker} closed")]
    WorkerOutputClosed { worker: usize },

    /// Every worker output channel has closed; the router has nothing left
    /// to multiplex.
    #[error("all worker output channels closed")]
    WorkersGone,

    /// The stage processor upcall failed.
    #[error("processor failed on worker {worker}: {error}")]
    Processor { worker: usize, error: anyhow::Error },

    /// A handle could not be resolved against the transaction store.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// The configured pipeline has no entry for this stage id.
    #[error("stage {stage} not present in configuration")]
    UnknownStage { stage: StageId },
}
