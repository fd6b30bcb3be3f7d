// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Egress router: readiness-multiplexed fan-in over the worker outputs and
//! the per-transaction routing state machine.
//!
//! One task per stage, and the single writer of `hop_count` anywhere in the
//! system: handlers may steer `route_id`, but only this loop advances a
//! transaction along its route. Whichever worker output becomes ready first
//! is drained first; ordering across workers is deliberately unspecified.
//!
//! The transition per transaction: bump `hop_count`, look the next stage up
//! in the route table, and hand the handle back to the transport. A route
//! that is exhausted (or unknown) resolves to the terminal convention: the
//! transaction returns to the entry gateway.

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{StreamExt, StreamMap};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::consts::GATEWAY_STAGE_ID;
use crate::config::{NextHop, RouteTable, StageId};
use crate::errors::{EngineError, StoreError};
use crate::observability::messages::stage::TransactionForwarded;
use crate::observability::messages::StructuredLog;
use crate::store::{TransactionStore, TxnHandle};
use crate::traits::Transport;

/// Run the egress loop until shutdown or a fatal error.
///
/// Fatal conditions: every worker output gone, a handle that fails to
/// resolve, or a transport send failure. All kill this loop only.
pub(crate) async fn run_router(
    stage_id: StageId,
    outputs: Vec<mpsc::Receiver<TxnHandle>>,
    routes: RouteTable,
    store: Arc<dyn TransactionStore>,
    transport: Arc<dyn Transport>,
    shutdown: CancellationToken,
) -> Result<(), EngineError> {
    let mut ready: StreamMap<usize, ReceiverStream<TxnHandle>> = StreamMap::new();
    for (worker, output) in outputs.into_iter().enumerate() {
        ready.insert(worker, ReceiverStream::new(output));
    }
    debug!(stage = stage_id, workers = ready.len(), "router running");

    loop {
        let (worker, handle) = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            next = ready.next() => next.ok_or(EngineError::WorkersGone)?,
        };
        debug!(stage = stage_id, worker, handle = handle.into_raw(), "router picked up transaction");

        let entry = store.resolve(handle)?;
        let (destination, hop_count, terminal) = {
            let mut txn = entry
                .lock()
                .map_err(|_| EngineError::Store(StoreError::Poisoned))?;
            txn.hop_count += 1;
            match routes.next_hop(txn.route_id, txn.hop_count) {
                NextHop::Stage(stage) => (stage, txn.hop_count, false),
                NextHop::Terminal => (GATEWAY_STAGE_ID, txn.hop_count, true),
            }
        };

        TransactionForwarded {
            stage: stage_id,
            handle: handle.into_raw(),
            destination,
            hop_count,
            terminal,
        }
        .log();

        transport.send(handle, destination).await?;
    }
}
