// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Full-mesh TCP transport between stage processes.
//!
//! Every stage binds one listening endpoint at its deterministic address
//! (`base_port + stage_id`) and dials one outbound connection to every
//! other stage. Connections are long-lived: the mesh is built once at
//! startup and amortizes connection setup across the life of the process,
//! keeping each hop to a single read/write pair.
//!
//! Receive-side multiplexing: an acceptor task registers every inbound
//! connection with a dedicated reader task, and all readers funnel decoded
//! envelopes into one bounded ingress channel. `receive()` simply awaits
//! that channel, so whichever connection becomes readable first is served
//! first. Per-connection order holds; cross-connection order does not.
//!
//! Outbound dialing retries with bounded exponential backoff because peer
//! listeners may not be up yet during a rolling start. That retry is the
//! only self-healing behavior in the transport: once the mesh is up, any
//! I/O failure is surfaced to the caller and the owning loop dies loudly.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::consts::{
    CONNECT_BACKOFF_CAP, CONNECT_BACKOFF_INITIAL, CONNECT_MAX_ATTEMPTS, INGRESS_CHANNEL_CAPACITY,
};
use crate::config::{PipelineConfig, StageId};
use crate::errors::TransportError;
use crate::observability::messages::mesh::{ListenerBound, PeerConnected, PeerUnreachable};
use crate::observability::messages::StructuredLog;
use crate::store::TxnHandle;
use crate::traits::Transport;
use crate::transport::envelope::{Envelope, ENVELOPE_LEN};

type IngressItem = Result<Envelope, TransportError>;

/// The production [`Transport`]: one listener, S−1 outbound connections.
///
/// Inbound and outbound roles are asymmetric on purpose: data always flows
/// over the connection its *sender* dialed, so accepted connections are
/// read-only and dialed connections are write-only. Each stage is therefore
/// simultaneously a server for its peers' envelopes and a client for its
/// own.
pub struct MeshTransport {
    stage_id: StageId,
    ingress: Mutex<mpsc::Receiver<IngressItem>>,
    peers: Mutex<HashMap<StageId, TcpStream>>,
    shutdown: CancellationToken,
}

impl MeshTransport {
    /// Build the mesh for `stage_id`: bind the local listener, start the
    /// acceptor, and dial every peer.
    ///
    /// A bind failure is fatal. A peer that stays unreachable through the
    /// whole backoff budget is logged and left unconnected: the stage runs
    /// degraded and sends to that peer fail explicitly at send time.
    pub async fn connect(
        stage_id: StageId,
        config: &PipelineConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, TransportError> {
        let addr = config.listen_addr(stage_id);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        ListenerBound {
            stage: stage_id,
            addr,
        }
        .log();

        let (ingress_tx, ingress_rx) = mpsc::channel(INGRESS_CHANNEL_CAPACITY);
        tokio::spawn(Self::run_acceptor(
            stage_id,
            listener,
            ingress_tx,
            shutdown.clone(),
        ));

        // Dial all peers concurrently; each dial runs its own backoff.
        let mut dials = JoinSet::new();
        for peer in 0..config.total_stages() as StageId {
            if peer == stage_id {
                continue;
            }
            let peer_addr = config.listen_addr(peer);
            let token = shutdown.clone();
            dials.spawn(async move { (peer, connect_with_backoff(peer, peer_addr, &token).await) });
        }

        let mut peers = HashMap::new();
        while let Some(joined) = dials.join_next().await {
            let (peer, result) = match joined {
                Ok(outcome) => outcome,
                Err(_) => continue,
            };
            match result {
                Ok((stream, attempts)) => {
                    PeerConnected {
                        stage: stage_id,
                        peer,
                        attempts,
                    }
                    .log();
                    peers.insert(peer, stream);
                }
                Err(error) => {
                    PeerUnreachable {
                        stage: stage_id,
                        peer,
                        error: &error,
                    }
                    .log();
                }
            }
        }

        Ok(Self {
            stage_id,
            ingress: Mutex::new(ingress_rx),
            peers: Mutex::new(peers),
            shutdown,
        })
    }

    async fn run_acceptor(
        stage_id: StageId,
        listener: TcpListener,
        ingress: mpsc::Sender<IngressItem>,
        shutdown: CancellationToken,
    ) {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };
            match accepted {
                Ok((stream, remote)) => {
                    debug!(stage = stage_id, %remote, "accepted peer connection");
                    if let Err(error) = stream.set_nodelay(true) {
                        warn!(stage = stage_id, %remote, %error, "failed to set TCP_NODELAY");
                    }
                    tokio::spawn(Self::run_reader(
                        stream,
                        ingress.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(error) => {
                    // A failed accept drops that one peer attempt, not the
                    // listener; the peer's own backoff covers the retry.
                    warn!(stage = stage_id, %error, "accept failed");
                }
            }
        }
    }

    async fn run_reader(
        mut stream: TcpStream,
        ingress: mpsc::Sender<IngressItem>,
        shutdown: CancellationToken,
    ) {
        loop {
            let mut buf = [0u8; ENVELOPE_LEN];
            let read = tokio::select! {
                _ = shutdown.cancelled() => return,
                read = stream.read_exact(&mut buf) => read,
            };
            let outcome = match read {
                Ok(_) => Ok(Envelope::decode(&buf)),
                Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                    Err(TransportError::PeerClosed)
                }
                Err(source) => Err(TransportError::Recv { source }),
            };
            let failed = outcome.is_err();
            if ingress.send(outcome).await.is_err() || failed {
                return;
            }
        }
    }
}

#[async_trait]
impl Transport for MeshTransport {
    async fn receive(&self) -> Result<Envelope, TransportError> {
        let mut ingress = self.ingress.lock().await;
        match ingress.recv().await {
            Some(Ok(envelope)) => Ok(envelope),
            Some(Err(error)) => Err(error),
            None => Err(TransportError::Closed),
        }
    }

    async fn send(&self, handle: TxnHandle, destination: StageId) -> Result<(), TransportError> {
        let record = Envelope::new(destination, handle).encode();
        let mut peers = self.peers.lock().await;
        let stream = peers
            .get_mut(&destination)
            .ok_or(TransportError::PeerUnavailable { stage: destination })?;
        // write_all retries short writes until the record is complete.
        stream
            .write_all(&record)
            .await
            .map_err(|source| TransportError::Send {
                stage: destination,
                source,
            })?;
        debug!(
            stage = self.stage_id,
            destination,
            handle = handle.into_raw(),
            "sent envelope"
        );
        Ok(())
    }

    async fn shutdown(&self) {
        self.shutdown.cancel();
        self.peers.lock().await.clear();
    }
}

/// Dial one peer with bounded exponential backoff: 50 ms doubling to a 2 s
/// cap, at most 10 attempts. Returns the stream and how many attempts it
/// took.
async fn connect_with_backoff(
    stage: StageId,
    addr: SocketAddr,
    shutdown: &CancellationToken,
) -> Result<(TcpStream, u32), TransportError> {
    let mut delay = CONNECT_BACKOFF_INITIAL;
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                if let Err(error) = stream.set_nodelay(true) {
                    warn!(peer = stage, %addr, %error, "failed to set TCP_NODELAY");
                }
                return Ok((stream, attempt));
            }
            Err(source) => {
                if attempt >= CONNECT_MAX_ATTEMPTS {
                    return Err(TransportError::Connect {
                        stage,
                        addr,
                        attempts: attempt,
                        source,
                    });
                }
                debug!(peer = stage, %addr, attempt, "peer not ready, backing off");
                tokio::select! {
                    _ = shutdown.cancelled() => return Err(TransportError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                delay = (delay * 2).min(CONNECT_BACKOFF_CAP);
            }
        }
    }
}
