// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit the same event with structured fields attached.
//!
//! # Organization
//!
//! * `mesh` - Transport mesh lifecycle events
//! * `stage` - Stage engine lifecycle and routing events
//!
//! # Usage Pattern
//!
//! ```rust
//! use bucket_brigade::observability::messages::StructuredLog;
//! use bucket_brigade::observability::messages::stage::StageStarted;
//!
//! let msg = StageStarted { stage: 1, workers: 4 };
//! msg.log();
//! ```

use tracing::Span;

pub mod mesh;
pub mod stage;

/// Emit a message through `tracing` with structured fields.
pub trait StructuredLog {
    /// Log the event at the level appropriate for the message type.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
