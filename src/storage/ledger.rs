//! Ledger backing: the append-only `ledger.jsonl` record log.

use std::{fs, io, path::PathBuf};

// Traits must be in scope for `.lines()` on `BufReader` and `.write_all()` on `File`.
use io::{BufRead, Write};

use crate::model::LedgerRecord;

use super::{LedgerBacking, Result};

/// JSONL-backed ledger log: one record per line, in append order.
///
/// Records serialize with a fixed field order, so the bytes on disk hash
/// identically after any number of reload cycles.
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerBacking for FileLedger {
    fn load(&self) -> Result<Vec<LedgerRecord>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.is_empty() {
                records.push(serde_json::from_str(&line)?);
            }
        }
        Ok(records)
    }

    fn append(&mut self, record: &LedgerRecord) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    use crate::model::{Event, GENESIS_PREVIOUS_HASH, compute_hash};

    fn sample_record(index: u64, previous_hash: &str) -> LedgerRecord {
        let timestamp = Timestamp::new(1_700_000_000 + i64::try_from(index).unwrap(), 0).unwrap();
        let payload = Event::SubsidyChecked {
            subject: "9876500001".into(),
            land_acres: 2.0,
            category: "General".into(),
            schemes: vec!["PM-KISAN".into()],
        };
        let hash = compute_hash(index, &payload, previous_hash, &timestamp).unwrap();
        LedgerRecord {
            index,
            timestamp,
            payload,
            previous_hash: previous_hash.into(),
            hash,
        }
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let backing = FileLedger::new(dir.path().join("ledger.jsonl"));

        assert!(backing.load().unwrap().is_empty());
    }

    #[test]
    fn append_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut backing = FileLedger::new(dir.path().join("ledger.jsonl"));

        let first = sample_record(0, GENESIS_PREVIOUS_HASH);
        let second = sample_record(1, &first.hash);
        backing.append(&first).unwrap();
        backing.append(&second).unwrap();

        let records = backing.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hash, first.hash);
        assert_eq!(records[1].previous_hash, first.hash);
    }

    #[test]
    fn loaded_records_still_hash_correctly() {
        let dir = TempDir::new().unwrap();
        let mut backing = FileLedger::new(dir.path().join("ledger.jsonl"));

        let record = sample_record(0, GENESIS_PREVIOUS_HASH);
        backing.append(&record).unwrap();

        let loaded = &backing.load().unwrap()[0];
        assert_eq!(loaded.expected_hash().unwrap(), record.hash);
    }
}
