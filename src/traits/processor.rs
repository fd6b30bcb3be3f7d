// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::store::TxnHandle;

/// The per-stage application upcall.
///
/// The engine hands a worker one transaction handle at a time; the
/// processor executes one processing step against the referenced
/// transaction and returns control. All protocol and business semantics
/// live behind this trait. A processor may set `route_id` (on first
/// contact), `step`, and the payload, but must never write `hop_count`;
/// the egress router is that field's single writer.
///
/// The handle itself must come back unchanged in identity: processors
/// mutate the transaction, not the reference to it.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, txn: TxnHandle) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}
