// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use bucket_brigade::config::{load_and_validate_config, StageId};
use bucket_brigade::engine::{Stage, StageContext, WorkloadProcessor};
use bucket_brigade::store::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <stage-id> <config.yaml>", args[0]);
        eprintln!("Example: {} 1 configs/pipeline.yaml", args[0]);
        std::process::exit(1);
    }

    let stage_id: StageId = args[1]
        .parse()
        .context("stage id must be a non-negative integer")?;
    let config = Arc::new(load_and_validate_config(&args[2])?);
    let stage_cfg = config
        .stage(stage_id)
        .with_context(|| format!("stage {stage_id} is not declared in {}", args[2]))?;

    // A real multi-process deployment attaches to the shared transaction
    // segment published by the configuration collaborator; the in-memory
    // store stands in for single-process runs.
    let store = Arc::new(InMemoryStore::new());
    let processor = Arc::new(WorkloadProcessor::new(stage_cfg.workload.clone()));

    let ctx = StageContext {
        stage_id,
        config,
        store,
        shutdown: CancellationToken::new(),
    };
    let stage = Stage::start(ctx, processor).await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!(stage = stage_id, "shutting down");
    stage.shutdown().await;

    Ok(())
}
