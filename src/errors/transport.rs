// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the full-mesh transport layer.
//!
//! Connection establishment distinguishes transient peer-not-ready failures
//! (retried with backoff, surfaced only once the retry budget is exhausted)
//! from everything else. All post-startup I/O failures are fatal to the loop
//! that observes them; none are retried.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::StageId;

/// Errors raised by the mesh transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The local listening endpoint could not be created. Fatal to stage
    /// startup: a stage that cannot accept peers never joins the mesh.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// An outbound connection could not be established within the retry
    /// budget. The peer is left unconnected; later sends to it fail with
    /// [`TransportError::PeerUnavailable`].
    #[error("failed to connect to stage {stage} at {addr} after {attempts} attempts: {source}")]
    Connect {
        stage: StageId,
        addr: SocketAddr,
        attempts: u32,
        source: io::Error,
    },

    /// No live outbound connection exists for the destination stage.
    #[error("no live connection to stage {stage}")]
    PeerUnavailable { stage: StageId },

    /// A peer connection failed while reading an envelope.
    #[error("error receiving envelope from peer: {source}")]
    Recv { source: io::Error },

    /// A peer closed its connection. The serving loop treats this the same
    /// as any other receive failure: fatal, requiring external supervision.
    #[error("peer connection closed")]
    PeerClosed,

    /// Writing an envelope to the destination's connection failed.
    #[error("failed to send envelope to stage {stage}: {source}")]
    Send { stage: StageId, source: io::Error },

    /// The transport has been shut down; no further envelopes will arrive.
    #[error("transport is shut down")]
    Closed,

    /// Startup was cancelled before the mesh finished connecting.
    #[error("transport startup cancelled")]
    Cancelled,
}
