// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ingress dispatcher: transport receive loop fanning out to the worker
//! pool.
//!
//! One task per stage. Every envelope pulled off the transport goes to the
//! next worker in strict round-robin order, independent of which peer
//! connection it arrived on. That keeps worker load even no matter how
//! lopsided the upstream stages are. Worker input channels are bounded, so
//! a worker that stops consuming backs the dispatcher up instead of letting
//! transactions vanish.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StageId;
use crate::errors::EngineError;
use crate::store::TxnHandle;
use crate::traits::Transport;

/// Run the dispatch loop until shutdown or a fatal error.
///
/// Fatal conditions: a transport receive failure, or a worker input channel
/// whose receiver is gone. Both kill this loop only; the error is returned
/// for the stage runtime to log.
pub(crate) async fn run_dispatcher(
    stage_id: StageId,
    transport: Arc<dyn Transport>,
    workers: Vec<mpsc::Sender<TxnHandle>>,
    shutdown: CancellationToken,
) -> Result<(), EngineError> {
    debug!(stage = stage_id, workers = workers.len(), "dispatcher running");

    let mut next = 0usize;
    loop {
        let envelope = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            received = transport.receive() => received?,
        };

        let worker = &workers[next];
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            sent = worker.send(envelope.handle) => {
                sent.map_err(|_| EngineError::WorkerInputClosed { worker: next })?;
            }
        }

        // Advance on every successful dispatch, regardless of source.
        next = (next + 1) % workers.len();
    }
}
