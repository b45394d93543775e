//! Advisory backing: a single SQLite database.
//!
//! Selected with `advisory-backend = "sqlite"` in the config. One row per
//! advisory; `seq` preserves insertion order within a subject.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use jiff::civil::Date;
use rusqlite::Connection;

use crate::model::{AdvisoryKind, AdvisoryRecord, AdvisoryStatus};

use super::{AdvisoryBacking, Result, StorageError};

/// SQLite-backed advisory histories.
///
/// `rusqlite::Connection` is `Send` but not `Sync`; the `Mutex` makes the
/// backing shareable across the store's per-subject writers.
pub struct SqliteAdvisories {
    conn: Mutex<Connection>,
}

impl SqliteAdvisories {
    /// Opens (or creates) the database and its schema.
    pub fn open(path: PathBuf) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS advisories (
                 subject   TEXT NOT NULL,
                 seq       INTEGER NOT NULL,
                 id        TEXT NOT NULL,
                 kind      TEXT NOT NULL,
                 message   TEXT NOT NULL,
                 issued_at TEXT NOT NULL,
                 status    TEXT NOT NULL,
                 PRIMARY KEY (subject, seq)
             )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AdvisoryBacking for SqliteAdvisories {
    fn load(&self) -> Result<BTreeMap<String, Vec<AdvisoryRecord>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT subject, id, kind, message, issued_at, status
             FROM advisories ORDER BY subject, seq",
        )?;
        let mut rows = stmt.query([])?;
        let mut histories: BTreeMap<String, Vec<AdvisoryRecord>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let subject: String = row.get(0)?;
            let record = AdvisoryRecord {
                id: row.get(1)?,
                subject: subject.clone(),
                kind: kind_from_str(&row.get::<_, String>(2)?)?,
                message: row.get(3)?,
                issued_at: parse_date(&row.get::<_, String>(4)?)?,
                status: status_from_str(&row.get::<_, String>(5)?)?,
            };
            histories.entry(subject).or_default().push(record);
        }
        Ok(histories)
    }

    fn save_subject(&self, subject: &str, history: &[AdvisoryRecord]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM advisories WHERE subject = ?1", [subject])?;
        for (seq, record) in (0i64..).zip(history) {
            tx.execute(
                "INSERT INTO advisories (subject, seq, id, kind, message, issued_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    subject,
                    seq,
                    &record.id,
                    record.kind.as_str(),
                    &record.message,
                    record.issued_at.to_string(),
                    record.status.as_str(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Reconstructs an `AdvisoryKind` from its column value.
fn kind_from_str(kind: &str) -> Result<AdvisoryKind> {
    match kind {
        "irrigation" => Ok(AdvisoryKind::Irrigation),
        "fertilizer" => Ok(AdvisoryKind::Fertilizer),
        "pesticide" => Ok(AdvisoryKind::Pesticide),
        "weather" => Ok(AdvisoryKind::Weather),
        "pest" => Ok(AdvisoryKind::Pest),
        other => Err(StorageError::Corrupt(format!(
            "unknown advisory kind: {other}"
        ))),
    }
}

/// Reconstructs an `AdvisoryStatus` from its column value.
fn status_from_str(status: &str) -> Result<AdvisoryStatus> {
    match status {
        "pending" => Ok(AdvisoryStatus::Pending),
        "followed" => Ok(AdvisoryStatus::Followed),
        "ignored" => Ok(AdvisoryStatus::Ignored),
        other => Err(StorageError::Corrupt(format!(
            "unknown advisory status: {other}"
        ))),
    }
}

fn parse_date(raw: &str) -> Result<Date> {
    raw.parse::<Date>()
        .map_err(|e| StorageError::Corrupt(format!("invalid issued_at: {e}")))
}
