// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::config::StageId;

/// Stage id every terminal hop resolves to: the pipeline's entry gateway.
pub const GATEWAY_STAGE_ID: StageId = 0;

/// Default base for deterministic stage addressing: stage `i` listens on
/// `base_port + i`.
pub const DEFAULT_BASE_PORT: u16 = 8000;

/// Upper bound on stages in one pipeline, keeping the derived port range
/// well inside a single contiguous block.
pub const MAX_STAGES: usize = 250;

/// Buffered envelopes between the transport's connection readers and the
/// ingress dispatcher.
pub const INGRESS_CHANNEL_CAPACITY: usize = 1024;

/// Buffered transactions per worker input/output channel. A stalled worker
/// backs up at most this many transactions before the dispatcher blocks.
pub const WORKER_CHANNEL_CAPACITY: usize = 64;

/// First delay of the outbound-connect backoff schedule.
pub const CONNECT_BACKOFF_INITIAL: Duration = Duration::from_millis(50);

/// Ceiling for the doubling backoff delay.
pub const CONNECT_BACKOFF_CAP: Duration = Duration::from_secs(2);

/// Connection attempts per peer before giving up and leaving the peer
/// unconnected.
pub const CONNECT_MAX_ATTEMPTS: u32 = 10;
