// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::StageId;
use crate::errors::TransportError;
use crate::store::TxnHandle;
use crate::transport::Envelope;

/// The engine's contract with the inter-stage transport.
///
/// Production stages use the TCP mesh implementation; tests substitute a
/// scripted transport to exercise the engine without sockets.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Block until one envelope is available from any peer connection.
    ///
    /// Per-connection order is preserved; no ordering holds across
    /// connections. An error is fatal to the serving loop that called it.
    async fn receive(&self) -> Result<Envelope, TransportError>;

    /// Deliver one transaction handle to the destination stage.
    ///
    /// Exactly one envelope is written; short writes are retried until the
    /// record is complete or the connection fails. Fails explicitly when no
    /// live connection to the destination exists.
    async fn send(&self, handle: TxnHandle, destination: StageId) -> Result<(), TransportError>;

    /// Close every owned socket. Idempotent; safe to call on a transport
    /// that never finished initializing.
    async fn shutdown(&self);
}
