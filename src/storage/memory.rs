//! In-memory backings: persistence-free stores for tests and embedders.

use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use crate::model::{AdvisoryRecord, LedgerRecord};

use super::{AdvisoryBacking, LedgerBacking, Result};

/// Ledger backing that keeps records in memory only.
#[derive(Default)]
pub struct MemoryLedger {
    records: Vec<LedgerRecord>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerBacking for MemoryLedger {
    fn load(&self) -> Result<Vec<LedgerRecord>> {
        Ok(self.records.clone())
    }

    fn append(&mut self, record: &LedgerRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Advisory backing that keeps histories in memory only.
#[derive(Default)]
pub struct MemoryAdvisories {
    histories: Mutex<BTreeMap<String, Vec<AdvisoryRecord>>>,
}

impl MemoryAdvisories {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdvisoryBacking for MemoryAdvisories {
    fn load(&self) -> Result<BTreeMap<String, Vec<AdvisoryRecord>>> {
        Ok(self
            .histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save_subject(&self, subject: &str, history: &[AdvisoryRecord]) -> Result<()> {
        self.histories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.to_string(), history.to_vec());
        Ok(())
    }
}
