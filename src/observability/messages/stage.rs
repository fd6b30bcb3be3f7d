// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stage engine lifecycle and routing events.
//!
//! This module contains message types for logging events related to:
//! * Stage startup and component wiring
//! * Component loop termination (the fatal-per-stage condition)
//! * Routing transitions at the egress router

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::config::StageId;
use crate::observability::messages::StructuredLog;

/// Stage engine started with all components wired.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageStarted {
    pub stage: StageId,
    pub workers: usize,
}

impl Display for StageStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} started with {} worker(s)",
            self.stage, self.workers
        )
    }
}

impl StructuredLog for StageStarted {
    fn log(&self) {
        tracing::info!(
            stage = self.stage,
            workers = self.workers,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_started",
            span_name = name,
            stage = self.stage,
            workers = self.workers,
        )
    }
}

/// An engine component's loop died. Surviving components keep running but
/// the stage is non-functional for new traffic and needs external
/// supervision.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ComponentTerminated<'a> {
    pub stage: StageId,
    pub component: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ComponentTerminated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage {} component '{}' terminated: {}",
            self.stage, self.component, self.error
        )
    }
}

impl StructuredLog for ComponentTerminated<'_> {
    fn log(&self) {
        tracing::error!(
            stage = self.stage,
            component = self.component,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "component_terminated",
            span_name = name,
            stage = self.stage,
            component = self.component,
            error = %self.error,
        )
    }
}

/// The egress router advanced a transaction and handed it to the transport.
///
/// # Log Level
/// `debug!` - Per-transaction event
pub struct TransactionForwarded {
    pub stage: StageId,
    pub handle: u64,
    pub destination: StageId,
    pub hop_count: u32,
    pub terminal: bool,
}

impl Display for TransactionForwarded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.terminal {
            write!(
                f,
                "Stage {} returning transaction {:#x} to gateway {} at hop {}",
                self.stage, self.handle, self.destination, self.hop_count
            )
        } else {
            write!(
                f,
                "Stage {} forwarding transaction {:#x} to stage {} at hop {}",
                self.stage, self.handle, self.destination, self.hop_count
            )
        }
    }
}

impl StructuredLog for TransactionForwarded {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            handle = self.handle,
            destination = self.destination,
            hop_count = self.hop_count,
            terminal = self.terminal,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "transaction_forwarded",
            span_name = name,
            stage = self.stage,
            handle = self.handle,
            destination = self.destination,
            hop_count = self.hop_count,
            terminal = self.terminal,
        )
    }
}
