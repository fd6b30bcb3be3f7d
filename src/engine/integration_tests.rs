// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine integration tests: the component loops against a scripted
//! transport, and the full three-stage pipeline against the real mesh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::consts::GATEWAY_STAGE_ID;
use crate::config::{PipelineConfig, RouteTable, StageConfig, StageId, WorkloadConfig};
use crate::engine::dispatcher::run_dispatcher;
use crate::engine::router::run_router;
use crate::engine::{Stage, StageContext, WorkloadProcessor};
use crate::errors::{EngineError, TransportError};
use crate::store::{InMemoryStore, Transaction, TransactionStore, TxnHandle};
use crate::traits::{Processor, Transport};
use crate::transport::{Envelope, MeshTransport};

/// Scripted transport: envelopes are fed in through a channel and sends are
/// captured for inspection.
struct MockTransport {
    incoming: Mutex<mpsc::Receiver<Result<Envelope, TransportError>>>,
    sent: mpsc::UnboundedSender<(TxnHandle, StageId)>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn receive(&self) -> Result<Envelope, TransportError> {
        let mut incoming = self.incoming.lock().await;
        match incoming.recv().await {
            Some(outcome) => outcome,
            None => Err(TransportError::Closed),
        }
    }

    async fn send(&self, handle: TxnHandle, destination: StageId) -> Result<(), TransportError> {
        self.sent
            .send((handle, destination))
            .map_err(|_| TransportError::Closed)
    }

    async fn shutdown(&self) {}
}

type Feed = mpsc::Sender<Result<Envelope, TransportError>>;
type SentLog = mpsc::UnboundedReceiver<(TxnHandle, StageId)>;

fn mock_transport() -> (Arc<MockTransport>, Feed, SentLog) {
    let (feed_tx, feed_rx) = mpsc::channel(256);
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let transport = Arc::new(MockTransport {
        incoming: Mutex::new(feed_rx),
        sent: sent_tx,
    });
    (transport, feed_tx, sent_rx)
}

fn pipeline_config(base_port: u16, worker_counts: &[usize], routes: Vec<Vec<StageId>>) -> PipelineConfig {
    PipelineConfig {
        base_port,
        stages: worker_counts
            .iter()
            .enumerate()
            .map(|(id, workers)| StageConfig {
                id: id as StageId,
                workers: *workers,
                workload: WorkloadConfig::default(),
            })
            .collect(),
        routes: RouteTable::from(routes),
    }
}

/// Increments the transaction's application step counter; never touches
/// `hop_count`.
struct CountingProcessor {
    store: Arc<dyn TransactionStore>,
}

#[async_trait]
impl Processor for CountingProcessor {
    async fn process(&self, txn: TxnHandle) -> anyhow::Result<()> {
        let entry = self.store.resolve(txn)?;
        let mut txn = entry.lock().expect("entry lock");
        txn.step += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

struct FailingProcessor;

#[async_trait]
impl Processor for FailingProcessor {
    async fn process(&self, _txn: TxnHandle) -> anyhow::Result<()> {
        anyhow::bail!("simulated processor failure")
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[tokio::test]
async fn dispatcher_fans_out_round_robin() {
    let (transport, feed, _sent) = mock_transport();
    let shutdown = CancellationToken::new();

    let mut worker_inputs = Vec::new();
    let mut worker_outputs = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel(32);
        worker_inputs.push(tx);
        worker_outputs.push(rx);
    }

    let dispatcher = tokio::spawn(run_dispatcher(
        1,
        transport,
        worker_inputs,
        shutdown.clone(),
    ));

    for raw in 0..10u64 {
        feed.send(Ok(Envelope::new(1, TxnHandle::from_raw(raw))))
            .await
            .unwrap();
    }
    drop(feed);

    // The dispatcher dies on the closed feed; that's the expected fatal
    // receive failure.
    let outcome = dispatcher.await.unwrap();
    assert!(matches!(
        outcome,
        Err(EngineError::Transport(TransportError::Closed))
    ));

    let mut counts = Vec::new();
    let mut seen = Vec::new();
    for mut output in worker_outputs {
        let mut count = 0;
        while let Ok(handle) = output.try_recv() {
            seen.push(handle.into_raw());
            count += 1;
        }
        counts.push(count);
    }

    // 10 inputs over 3 workers: 4/3/3, with worker 0 first in rotation.
    assert_eq!(counts, vec![4, 3, 3]);
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn router_walks_route_then_terminal_never_beyond() {
    let (transport, _feed, mut sent) = mock_transport();
    let store: Arc<dyn TransactionStore> = Arc::new(InMemoryStore::new());
    let shutdown = CancellationToken::new();

    let handle = store.insert(Transaction::new(0)).unwrap();
    let (output_tx, output_rx) = mpsc::channel(8);

    let router = tokio::spawn(run_router(
        1,
        vec![output_rx],
        RouteTable::from(vec![vec![1, 2]]),
        store.clone(),
        transport,
        shutdown.clone(),
    ));

    // After k successful transitions, hop_count = k. The captured send is
    // the signal that transition k has completed.
    for expected_hops in 1..=3u32 {
        output_tx.send(handle).await.unwrap();
        sent.recv().await.unwrap();
        let entry = store.resolve(handle).unwrap();
        assert_eq!(entry.lock().unwrap().hop_count, expected_hops);
    }

    shutdown.cancel();
    router.await.unwrap().unwrap();
}

#[tokio::test]
async fn router_destinations_follow_route_table() {
    let (transport, _feed, mut sent) = mock_transport();
    let store: Arc<dyn TransactionStore> = Arc::new(InMemoryStore::new());
    let shutdown = CancellationToken::new();

    let handle = store.insert(Transaction::new(0)).unwrap();
    let (output_tx, output_rx) = mpsc::channel(8);

    let router = tokio::spawn(run_router(
        1,
        vec![output_rx],
        RouteTable::from(vec![vec![1, 2]]),
        store.clone(),
        transport,
        shutdown.clone(),
    ));

    // hop 0 -> 1: still on the route, forwarded to route[1] = 2.
    output_tx.send(handle).await.unwrap();
    assert_eq!(sent.recv().await.unwrap(), (handle, 2));

    // hop 1 -> 2: route exhausted, terminal resolves to the gateway.
    output_tx.send(handle).await.unwrap();
    assert_eq!(sent.recv().await.unwrap(), (handle, GATEWAY_STAGE_ID));

    // hop 2 -> 3: past the end stays terminal, never beyond.
    output_tx.send(handle).await.unwrap();
    assert_eq!(sent.recv().await.unwrap(), (handle, GATEWAY_STAGE_ID));

    shutdown.cancel();
    router.await.unwrap().unwrap();
}

#[tokio::test]
async fn router_returns_unknown_route_to_gateway() {
    let (transport, _feed, mut sent) = mock_transport();
    let store: Arc<dyn TransactionStore> = Arc::new(InMemoryStore::new());
    let shutdown = CancellationToken::new();

    let handle = store.insert(Transaction::new(42)).unwrap();
    let (output_tx, output_rx) = mpsc::channel(8);

    let router = tokio::spawn(run_router(
        1,
        vec![output_rx],
        RouteTable::from(vec![vec![1]]),
        store.clone(),
        transport,
        shutdown.clone(),
    ));

    output_tx.send(handle).await.unwrap();
    assert_eq!(sent.recv().await.unwrap(), (handle, GATEWAY_STAGE_ID));

    shutdown.cancel();
    router.await.unwrap().unwrap();
}

#[tokio::test]
async fn full_stage_processes_and_forwards() {
    let (transport, feed, mut sent) = mock_transport();
    let store = Arc::new(InMemoryStore::new());
    let config = Arc::new(pipeline_config(0, &[1, 2], vec![vec![1]]));

    let ctx = StageContext::new(1, config, store.clone());
    let processor = Arc::new(CountingProcessor {
        store: store.clone(),
    });
    let stage = Stage::start_with_transport(ctx, processor, transport).unwrap();

    let mut handles = Vec::new();
    for _ in 0..6 {
        let handle = store.insert(Transaction::new(0)).unwrap();
        handles.push(handle);
        feed.send(Ok(Envelope::new(1, handle))).await.unwrap();
    }

    // Every transaction exits the (single-hop) route back to the gateway.
    for _ in 0..6 {
        let (handle, destination) = sent.recv().await.unwrap();
        assert_eq!(destination, GATEWAY_STAGE_ID);
        assert!(handles.contains(&handle));
    }

    for handle in &handles {
        let entry = store.resolve(*handle).unwrap();
        let txn = entry.lock().unwrap();
        assert_eq!(txn.step, 1, "processor ran exactly once");
        assert_eq!(txn.hop_count, 1, "router transitioned exactly once");
    }

    stage.shutdown().await;
}

#[tokio::test]
async fn stalled_worker_backs_up_then_surfaces() {
    let (transport, feed, _sent) = mock_transport();
    let shutdown = CancellationToken::new();

    // One worker with a deliberately tiny queue that nobody drains.
    let (input_tx, input_rx) = mpsc::channel(2);

    let dispatcher = tokio::spawn(run_dispatcher(
        1,
        transport,
        vec![input_tx],
        shutdown.clone(),
    ));

    for raw in 0..4u64 {
        feed.send(Ok(Envelope::new(1, TxnHandle::from_raw(raw))))
            .await
            .unwrap();
    }

    // Two fit in the queue; the third blocks the dispatcher. It must not
    // complete, and it must not drop anything.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!dispatcher.is_finished());

    // The operator "kills" the worker: the queue vanishes and the blocked
    // dispatch surfaces as a fatal error instead of a silent drop.
    drop(input_rx);
    let outcome = dispatcher.await.unwrap();
    assert!(matches!(
        outcome,
        Err(EngineError::WorkerInputClosed { worker: 0 })
    ));
}

#[tokio::test]
async fn processor_failure_kills_worker_not_stage() {
    let (transport, feed, mut sent) = mock_transport();
    let store = Arc::new(InMemoryStore::new());
    let config = Arc::new(pipeline_config(0, &[1, 1], vec![vec![1]]));

    let ctx = StageContext::new(1, config, store.clone());
    let stage = Stage::start_with_transport(ctx, Arc::new(FailingProcessor), transport).unwrap();

    let handle = store.insert(Transaction::new(0)).unwrap();
    feed.send(Ok(Envelope::new(1, handle))).await.unwrap();

    // The worker dies processing it; nothing reaches the router.
    let forwarded = tokio::time::timeout(Duration::from_millis(200), sent.recv()).await;
    assert!(forwarded.is_err(), "failed transaction must not be forwarded");

    // The transaction's routing state was never advanced.
    let entry = store.resolve(handle).unwrap();
    assert_eq!(entry.lock().unwrap().hop_count, 0);

    stage.shutdown().await;
}

#[tokio::test]
async fn three_stage_pipeline_round_trip() {
    let config = Arc::new(pipeline_config(18210, &[1, 2, 1], vec![vec![1, 2]]));
    let store = Arc::new(InMemoryStore::new());
    let noop = || Arc::new(WorkloadProcessor::new(WorkloadConfig::default()));

    // The gateway joins the mesh as stage 0; stages 1 and 2 run the full
    // engine. All three come up concurrently, the way separate processes
    // would.
    let gateway_token = CancellationToken::new();
    let (gateway, stage1, stage2) = tokio::join!(
        MeshTransport::connect(0, &config, gateway_token.clone()),
        Stage::start(
            StageContext::new(1, config.clone(), store.clone()),
            noop(),
        ),
        Stage::start(
            StageContext::new(2, config.clone(), store.clone()),
            noop(),
        ),
    );
    let gateway = gateway.unwrap();
    let stage1 = stage1.unwrap();
    let stage2 = stage2.unwrap();

    // Entry: route 0, hop 0, injected at the route's first stage.
    let handle = store.insert(Transaction::new(0)).unwrap();
    gateway.send(handle, 1).await.unwrap();

    // The transaction traverses stage 1 then stage 2, then returns.
    let envelope = tokio::time::timeout(Duration::from_secs(5), gateway.receive())
        .await
        .expect("transaction should return to the gateway")
        .unwrap();
    assert_eq!(envelope.handle, handle);
    assert_eq!(envelope.destination, GATEWAY_STAGE_ID);

    let entry = store.resolve(handle).unwrap();
    assert_eq!(entry.lock().unwrap().hop_count, 2);
    drop(entry);

    // Exactly two inter-stage hops: nothing else arrives.
    let extra = tokio::time::timeout(Duration::from_millis(200), gateway.receive()).await;
    assert!(extra.is_err(), "no further forwarding after terminal");

    let txn = store.remove(handle).unwrap();
    assert_eq!(txn.route_id, 0);

    stage1.shutdown().await;
    stage2.shutdown().await;
    gateway.shutdown().await;
}
