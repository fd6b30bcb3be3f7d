// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stage runtime: the context object and the task set that make up one
//! running stage process.
//!
//! `StageContext` is built once at startup and handed to every component:
//! stage identity, shared configuration, the transaction store, and the
//! shutdown token all travel together instead of living in process globals.
//! `Stage::start` wires the channel topology (transport → dispatcher →
//! workers → router → transport) and supervises the component tasks: a
//! component that dies is logged and stays dead, leaving the stage degraded
//! until external supervision restarts the process.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::consts::WORKER_CHANNEL_CAPACITY;
use crate::config::{PipelineConfig, StageId};
use crate::engine::dispatcher::run_dispatcher;
use crate::engine::router::run_router;
use crate::engine::worker::run_worker;
use crate::errors::EngineError;
use crate::observability::messages::stage::{ComponentTerminated, StageStarted};
use crate::observability::messages::StructuredLog;
use crate::store::TransactionStore;
use crate::traits::{Processor, Transport};
use crate::transport::MeshTransport;

/// Everything a stage component needs, constructed once at startup.
#[derive(Clone)]
pub struct StageContext {
    pub stage_id: StageId,
    pub config: Arc<PipelineConfig>,
    pub store: Arc<dyn TransactionStore>,
    pub shutdown: CancellationToken,
}

impl StageContext {
    pub fn new(
        stage_id: StageId,
        config: Arc<PipelineConfig>,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            stage_id,
            config,
            store,
            shutdown: CancellationToken::new(),
        }
    }
}

/// A running stage: its transport plus the supervised component tasks.
pub struct Stage {
    shutdown: CancellationToken,
    transport: Arc<dyn Transport>,
    tasks: Vec<JoinHandle<()>>,
}

impl Stage {
    /// Join the mesh and start the engine for this stage.
    pub async fn start(
        ctx: StageContext,
        processor: Arc<dyn Processor>,
    ) -> Result<Self, EngineError> {
        if ctx.config.stage(ctx.stage_id).is_none() {
            return Err(EngineError::UnknownStage {
                stage: ctx.stage_id,
            });
        }
        let transport =
            MeshTransport::connect(ctx.stage_id, &ctx.config, ctx.shutdown.child_token()).await?;
        Self::start_with_transport(ctx, processor, Arc::new(transport))
    }

    /// Start the engine on an already-connected transport. Tests use this
    /// to drive the engine with a scripted transport.
    pub fn start_with_transport(
        ctx: StageContext,
        processor: Arc<dyn Processor>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, EngineError> {
        let stage_cfg = ctx
            .config
            .stage(ctx.stage_id)
            .ok_or(EngineError::UnknownStage {
                stage: ctx.stage_id,
            })?;
        let workers = stage_cfg.workers;

        let mut tasks = Vec::with_capacity(workers + 2);
        let mut inputs = Vec::with_capacity(workers);
        let mut outputs = Vec::with_capacity(workers);

        for worker in 0..workers {
            let (input_tx, input_rx) = mpsc::channel(WORKER_CHANNEL_CAPACITY);
            let (output_tx, output_rx) = mpsc::channel(WORKER_CHANNEL_CAPACITY);
            inputs.push(input_tx);
            outputs.push(output_rx);

            tasks.push(supervise(
                ctx.stage_id,
                format!("worker-{worker}"),
                run_worker(
                    ctx.stage_id,
                    worker,
                    processor.clone(),
                    input_rx,
                    output_tx,
                    ctx.shutdown.clone(),
                ),
            ));
        }

        tasks.push(supervise(
            ctx.stage_id,
            "dispatcher".to_string(),
            run_dispatcher(
                ctx.stage_id,
                transport.clone(),
                inputs,
                ctx.shutdown.clone(),
            ),
        ));

        tasks.push(supervise(
            ctx.stage_id,
            "router".to_string(),
            run_router(
                ctx.stage_id,
                outputs,
                ctx.config.routes.clone(),
                ctx.store.clone(),
                transport.clone(),
                ctx.shutdown.clone(),
            ),
        ));

        StageStarted {
            stage: ctx.stage_id,
            workers,
        }
        .log();

        Ok(Self {
            shutdown: ctx.shutdown,
            transport,
            tasks,
        })
    }

    /// Stop every component, close the transport, and wait for the tasks to
    /// drain. Safe to call on a stage that already failed.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.transport.shutdown().await;
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Spawn a component loop and log its cause of death if it has one.
fn supervise(
    stage: StageId,
    component: String,
    loop_future: impl Future<Output = Result<(), EngineError>> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = loop_future.await {
            ComponentTerminated {
                stage,
                component: &component,
                error: &error,
            }
            .log();
        }
    })
}
