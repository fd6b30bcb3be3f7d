// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for transport mesh lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Listener creation and peer acceptance
//! * Outbound connection establishment (including backoff retries)
//! * Degraded peers left unconnected after retry exhaustion

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

use tracing::Span;

use crate::config::StageId;
use crate::observability::messages::StructuredLog;

/// Local listening endpoint bound and accepting peers.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ListenerBound {
    pub stage: StageId,
    pub addr: SocketAddr,
}

impl Display for ListenerBound {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage {} listening on {}", self.stage, self.addr)
    }
}

impl StructuredLog for ListenerBound {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            addr = %self.addr,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "listener_bound",
            span_name = name,
            stage = self.stage,
            addr = %self.addr,
        )
    }
}

/// Outbound connection to a peer established, possibly after retries.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PeerConnected {
    pub stage: StageId,
    pub peer: StageId,
    pub attempts: u32,
}

impl Display for PeerConnected {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} connected to peer {} after {} attempt(s)",
            self.stage, self.peer, self.attempts
        )
    }
}

impl StructuredLog for PeerConnected {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            peer = self.peer,
            attempts = self.attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "peer_connected",
            span_name = name,
            stage = self.stage,
            peer = self.peer,
            attempts = self.attempts,
        )
    }
}

/// A peer stayed unreachable through the whole retry budget. The stage runs
/// degraded: sends to this peer will fail until an operator restarts it.
///
/// # Log Level
/// `warn!` - Degraded but non-fatal
pub struct PeerUnreachable<'a> {
    pub stage: StageId,
    pub peer: StageId,
    pub error: &'a dyn std::error::Error,
}

impl Display for PeerUnreachable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} leaving peer {} unconnected: {}",
            self.stage, self.peer, self.error
        )
    }
}

impl StructuredLog for PeerUnreachable<'_> {
    fn log(&self) {
        tracing::warn!(
            stage = self.stage,
            peer = self.peer,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "peer_unreachable",
            span_name = name,
            stage = self.stage,
            peer = self.peer,
            error = %self.error,
        )
    }
}
