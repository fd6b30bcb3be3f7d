// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared transaction storage and the handle contract.
//!
//! Transactions live in storage addressable by every stage process, so only
//! a compact handle crosses the wire, never the transaction itself and
//! never a native pointer. A [`TxnHandle`] is a stable slot reference that
//! each process resolves locally through its attached [`TransactionStore`].
//!
//! The store itself is an external resource: the configuration collaborator
//! owns segment naming and attachment. This module defines the contract a
//! store must satisfy plus [`InMemoryStore`], an in-process implementation
//! used for tests and single-host runs where every "process" shares one
//! address space.
//!
//! Ownership discipline: a transaction is held by exactly one component at a
//! time (gateway, dispatcher, one worker, or the router), handed off via
//! channel send. The per-entry lock exists to satisfy the resolve-by-handle
//! contract, not to arbitrate real contention.

use std::sync::{Arc, Mutex};

use crate::errors::StoreError;

/// Upper bound on simultaneously live transactions in the default store.
pub const DEFAULT_STORE_CAPACITY: usize = 1024;

/// The unit of work flowing through the pipeline.
///
/// The core engine touches exactly two fields: it reads `route_id` and the
/// egress router increments `hop_count`. Everything else belongs to the
/// application: `step` keys multi-step handler state machines, `payload` is
/// opaque request/response bytes. The entry gateway creates a transaction
/// with `hop_count = 0` and a chosen `route_id`, and recycles it once a
/// terminal hop returns it.
#[derive(Debug, Default)]
pub struct Transaction {
    /// Which precomputed route this transaction follows.
    pub route_id: u32,
    /// How many routing transitions have completed. Written only by the
    /// egress router.
    pub hop_count: u32,
    /// Application-level step counter; never interpreted by the core.
    pub step: u32,
    /// Opaque application payload; never interpreted by the core.
    pub payload: Vec<u8>,
}

impl Transaction {
    /// Create a fresh transaction at the head of the given route.
    pub fn new(route_id: u32) -> Self {
        Self {
            route_id,
            ..Self::default()
        }
    }
}

/// A compact, process-portable reference to a transaction.
///
/// Handles are opaque to everything except the store that issued them and
/// must survive a trip across the wire bit-for-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnHandle(u64);

impl TxnHandle {
    /// Reconstruct a handle from its wire representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The wire representation of this handle.
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

/// The attach-convention seam for shared transaction storage.
///
/// Every stage process attaches to the same logical store and resolves the
/// same handle to the same transaction. Implementations must keep handles
/// stable for the lifetime of the transaction they reference and detect
/// references to recycled slots.
pub trait TransactionStore: Send + Sync {
    /// Allocate a slot for a new transaction and return its handle.
    fn insert(&self, txn: Transaction) -> Result<TxnHandle, StoreError>;

    /// Resolve a handle to its live entry.
    fn resolve(&self, handle: TxnHandle) -> Result<Arc<Mutex<Transaction>>, StoreError>;

    /// Release the slot and recover the transaction. Handles to the slot
    /// become stale immediately.
    fn remove(&self, handle: TxnHandle) -> Result<Transaction, StoreError>;
}

struct Slot {
    generation: u32,
    entry: Option<Arc<Mutex<Transaction>>>,
}

/// In-process [`TransactionStore`] backed by a slot vector with a free list.
///
/// Handles encode `(generation << 32) | slot_index`; the generation bumps on
/// every recycle so a stale handle is caught instead of silently resolving
/// to an unrelated transaction. Capacity is fixed up front so the
/// pipeline's memory footprint stays bounded no matter how fast the entry
/// point admits work.
pub struct InMemoryStore {
    slots: Mutex<SlotTable>,
    capacity: usize,
}

struct SlotTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl InMemoryStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STORE_CAPACITY)
    }

    /// Create a store holding at most `capacity` live transactions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(SlotTable {
                slots: Vec::new(),
                free: Vec::new(),
            }),
            capacity,
        }
    }

    /// Number of currently live transactions.
    pub fn len(&self) -> usize {
        let table = self.slots.lock().expect("slot table lock poisoned");
        table.slots.len() - table.free.len()
    }

    /// True when no transactions are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle_for(index: u32, generation: u32) -> TxnHandle {
        TxnHandle(((generation as u64) << 32) | index as u64)
    }

    fn decompose(handle: TxnHandle) -> (u32, u32) {
        ((handle.0 & 0xffff_ffff) as u32, (handle.0 >> 32) as u32)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionStore for InMemoryStore {
    fn insert(&self, txn: Transaction) -> Result<TxnHandle, StoreError> {
        let mut table = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        let entry = Some(Arc::new(Mutex::new(txn)));

        if let Some(index) = table.free.pop() {
            let slot = &mut table.slots[index as usize];
            slot.entry = entry;
            return Ok(Self::handle_for(index, slot.generation));
        }

        if table.slots.len() >= self.capacity {
            return Err(StoreError::Full {
                capacity: self.capacity,
            });
        }

        let index = table.slots.len() as u32;
        table.slots.push(Slot {
            generation: 0,
            entry,
        });
        Ok(Self::handle_for(index, 0))
    }

    fn resolve(&self, handle: TxnHandle) -> Result<Arc<Mutex<Transaction>>, StoreError> {
        let (index, generation) = Self::decompose(handle);
        let table = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        let slot = table
            .slots
            .get(index as usize)
            .ok_or(StoreError::StaleHandle { handle })?;
        if slot.generation != generation {
            return Err(StoreError::StaleHandle { handle });
        }
        slot.entry
            .as_ref()
            .cloned()
            .ok_or(StoreError::StaleHandle { handle })
    }

    fn remove(&self, handle: TxnHandle) -> Result<Transaction, StoreError> {
        let (index, generation) = Self::decompose(handle);
        let mut table = self.slots.lock().map_err(|_| StoreError::Poisoned)?;
        let slot = table
            .slots
            .get_mut(index as usize)
            .ok_or(StoreError::StaleHandle { handle })?;
        if slot.generation != generation {
            return Err(StoreError::StaleHandle { handle });
        }
        let entry = match slot.entry.take() {
            Some(entry) => entry,
            None => return Err(StoreError::StaleHandle { handle }),
        };

        let entry = match Arc::try_unwrap(entry) {
            Ok(inner) => inner,
            Err(entry) => {
                // Someone still holds the entry; put it back untouched.
                slot.entry = Some(entry);
                return Err(StoreError::InUse { handle });
            }
        };

        slot.generation = slot.generation.wrapping_add(1);
        table.free.push(index);
        entry.into_inner().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trips_through_raw_bits() {
        let handle = TxnHandle::from_raw(0xdead_beef_0000_0007);
        assert_eq!(TxnHandle::from_raw(handle.into_raw()), handle);
    }

    #[test]
    fn insert_resolve_remove() {
        let store = InMemoryStore::new();
        let handle = store.insert(Transaction::new(3)).unwrap();

        let entry = store.resolve(handle).unwrap();
        entry.lock().unwrap().hop_count = 2;
        drop(entry);

        let txn = store.remove(handle).unwrap();
        assert_eq!(txn.route_id, 3);
        assert_eq!(txn.hop_count, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn stale_handle_detected_after_recycle() {
        let store = InMemoryStore::new();
        let first = store.insert(Transaction::new(0)).unwrap();
        store.remove(first).unwrap();

        // Reuses the slot under a new generation.
        let second = store.insert(Transaction::new(1)).unwrap();
        assert_ne!(first, second);

        assert!(matches!(
            store.resolve(first),
            Err(StoreError::StaleHandle { .. })
        ));
        assert!(store.resolve(second).is_ok());
    }

    #[test]
    fn unknown_handle_is_stale() {
        let store = InMemoryStore::new();
        let bogus = TxnHandle::from_raw(42);
        assert!(matches!(
            store.resolve(bogus),
            Err(StoreError::StaleHandle { .. })
        ));
    }

    #[test]
    fn capacity_is_enforced() {
        let store = InMemoryStore::with_capacity(2);
        store.insert(Transaction::default()).unwrap();
        store.insert(Transaction::default()).unwrap();
        assert!(matches!(
            store.insert(Transaction::default()),
            Err(StoreError::Full { capacity: 2 })
        ));
    }

    #[test]
    fn remove_fails_while_entry_is_borrowed() {
        let store = InMemoryStore::new();
        let handle = store.insert(Transaction::default()).unwrap();
        let entry = store.resolve(handle).unwrap();

        assert!(matches!(
            store.remove(handle),
            Err(StoreError::InUse { .. })
        ));
        drop(entry);
        assert!(store.remove(handle).is_ok());
    }
}
