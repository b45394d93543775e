//! The event ledger: an append-only, hash-linked audit chain.
//!
//! A single [`Ledger`] owns the full sequence for the process: created
//! once at startup, seeded with a genesis record when its backing is
//! empty, grown monotonically, never truncated. Records are never edited
//! or removed — integrity problems are surfaced, not repaired.

use std::sync::{Mutex, MutexGuard, PoisonError};

use jiff::Timestamp;

use crate::model::{Event, GENESIS_PREVIOUS_HASH, LedgerRecord, compute_hash};
use crate::storage::{LedgerBacking, StorageError};

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The payload could not be canonically serialized for hashing.
    #[error("payload cannot be serialized: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    /// The stored chain fails verification. Fatal; never auto-repaired.
    #[error("ledger chain is broken at index {index}")]
    IntegrityViolation { index: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, LedgerError>;

/// Append-only, hash-linked sequence of audit records.
pub struct Ledger {
    inner: Mutex<Inner>,
}

struct Inner {
    chain: Vec<LedgerRecord>,
    backing: Box<dyn LedgerBacking>,
}

impl core::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

impl Ledger {
    /// Opens the ledger from its backing.
    ///
    /// Seeds (and persists) a genesis record when the backing is empty.
    /// Fails with [`LedgerError::IntegrityViolation`] when the stored
    /// chain does not verify — the process refuses to start on a
    /// tampered log.
    pub fn open(mut backing: Box<dyn LedgerBacking>) -> Result<Self> {
        let mut chain = backing.load()?;
        if chain.is_empty() {
            let genesis = build_record(0, Event::Genesis, GENESIS_PREVIOUS_HASH.to_string())?;
            backing.append(&genesis)?;
            chain.push(genesis);
        }
        if let Some(index) = first_broken_link(&chain) {
            return Err(LedgerError::IntegrityViolation { index });
        }
        Ok(Self {
            inner: Mutex::new(Inner { chain, backing }),
        })
    }

    /// Appends a payload as the next record and returns it.
    ///
    /// The read-tail-then-append sequence runs under an exclusive lock, so
    /// no two records can claim the same index or predecessor. The record
    /// is persisted before it is published to the in-memory chain; a
    /// failed write leaves the chain untouched.
    pub fn append(&self, payload: Event) -> Result<LedgerRecord> {
        let mut inner = self.lock();
        let index = inner.chain.len() as u64;
        let previous_hash = inner
            .chain
            .last()
            .map_or_else(|| GENESIS_PREVIOUS_HASH.to_string(), |tail| tail.hash.clone());
        let record = build_record(index, payload, previous_hash)?;
        inner.backing.append(&record)?;
        inner.chain.push(record.clone());
        Ok(record)
    }

    /// Recomputes every stored record's hash and checks end-to-end linkage,
    /// including that the durable chain still matches the in-memory one.
    ///
    /// False at the first mismatch. For integrity audits, not the hot path.
    pub fn verify(&self) -> bool {
        let inner = self.lock();
        let Ok(stored) = inner.backing.load() else {
            return false;
        };
        first_broken_link(&stored).is_none()
            && stored.len() == inner.chain.len()
            && stored.last().map(|r| &r.hash) == inner.chain.last().map(|r| &r.hash)
    }

    /// A read-only copy of the full chain, for audit export.
    ///
    /// Taken under the append lock: a snapshot sees each record in full
    /// or not at all.
    pub fn snapshot(&self) -> Vec<LedgerRecord> {
        self.lock().chain.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-append; persist-then-push keeps
        // the chain well-formed, so the data is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index of the first record that fails hash or linkage checks, if any.
pub fn first_broken_link(chain: &[LedgerRecord]) -> Option<u64> {
    let mut previous_hash = GENESIS_PREVIOUS_HASH;
    for (position, record) in chain.iter().enumerate() {
        let expected_index = position as u64;
        if record.index != expected_index || record.previous_hash != previous_hash {
            return Some(expected_index);
        }
        match record.expected_hash() {
            Ok(hash) if hash == record.hash => {}
            _ => return Some(expected_index),
        }
        previous_hash = &record.hash;
    }
    None
}

fn build_record(index: u64, payload: Event, previous_hash: String) -> Result<LedgerRecord> {
    let timestamp = Timestamp::now();
    let hash = compute_hash(index, &payload, &previous_hash, &timestamp)
        .map_err(LedgerError::InvalidPayload)?;
    Ok(LedgerRecord {
        index,
        timestamp,
        payload,
        previous_hash,
        hash,
    })
}
