// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Worker pool: one task per configured worker, each bound 1:1 to its own
//! input and output channel.
//!
//! A worker is deliberately boring: take one handle, run the stage's
//! processor upcall against it, pass the handle on. Channels are never
//! shared between workers, so there is no work stealing and no contention;
//! fairness is the dispatcher's job. A failure (channel or processor) kills
//! this worker only; the rest of the pool keeps draining its own queues.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StageId;
use crate::errors::EngineError;
use crate::store::TxnHandle;
use crate::traits::Processor;

/// Run one worker's loop until shutdown or a fatal error.
pub(crate) async fn run_worker(
    stage_id: StageId,
    worker: usize,
    processor: Arc<dyn Processor>,
    mut input: mpsc::Receiver<TxnHandle>,
    output: mpsc::Sender<TxnHandle>,
    shutdown: CancellationToken,
) -> Result<(), EngineError> {
    debug!(
        stage = stage_id,
        worker,
        processor = processor.name(),
        "worker running"
    );

    loop {
        let handle = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            received = input.recv() => {
                received.ok_or(EngineError::WorkerInputGone { worker })?
            }
        };

        processor
            .process(handle)
            .await
            .map_err(|error| EngineError::Processor { worker, error })?;

        // No cancellation check between processing and forwarding: once a
        // transaction has been processed it must reach the router.
        output
            .send(handle)
            .await
            .map_err(|_| EngineError::WorkerOutputClosed { worker })?;
    }
}
