// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::store::TxnHandle;

/// Errors raised by a transaction store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The handle does not reference a live transaction. Either the slot was
    /// never allocated or the transaction it referenced has been recycled.
    #[error("handle {handle:?} does not reference a live transaction")]
    StaleHandle { handle: TxnHandle },

    /// The store has no free slots left. The entry point must throttle new
    /// transactions until in-flight ones complete.
    #[error("transaction store is full (capacity {capacity})")]
    Full { capacity: usize },

    /// The transaction cannot be removed because something still holds a
    /// reference to its entry. Single-owner hand-off means this indicates a
    /// component kept an entry alive past its turn.
    #[error("transaction {handle:?} is still referenced")]
    InUse { handle: TxnHandle },

    /// A per-entry lock was poisoned by a panicking holder.
    #[error("transaction entry lock poisoned")]
    Poisoned,
}
