//! Local persistence for the ledger and advisory histories.
//!
//! Everything lives under a single storage root:
//!
//! ```text
//! <root>/
//!   ledger.jsonl               # append-only audit chain, one record per line
//!   advisories/<subject>.json  # one ordered advisory history per farmer
//!   advisories.sqlite          # alternative history backing (config: advisory-backend = "sqlite")
//! ```
//!
//! The in-memory logic never touches the filesystem directly: the ledger
//! and the advisory store each talk to a small backing trait, so tests and
//! embedders can swap in the in-memory implementations.

mod advisory;
mod ledger;
mod memory;
mod sqlite;

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use crate::model::{AdvisoryRecord, LedgerRecord};

pub use advisory::FileAdvisories;
pub use ledger::FileLedger;
pub use memory::{MemoryAdvisories, MemoryLedger};
pub use sqlite::SqliteAdvisories;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt storage: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Durable backing for the audit chain: an ordered, append-only record log.
pub trait LedgerBacking: Send {
    /// Loads every record in append order.
    fn load(&self) -> Result<Vec<LedgerRecord>>;

    /// Appends one record. Returns only after the write is flushed —
    /// callers treat a returned `Ok` as durable.
    fn append(&mut self, record: &LedgerRecord) -> Result<()>;
}

/// Durable backing for advisory histories, keyed by subject.
///
/// The store serializes writes per subject, so implementations only need
/// concurrent writes to *different* subjects to be safe.
pub trait AdvisoryBacking: Send + Sync {
    /// Loads every subject's ordered history.
    fn load(&self) -> Result<BTreeMap<String, Vec<AdvisoryRecord>>>;

    /// Overwrites one subject's full history.
    fn save_subject(&self, subject: &str, history: &[AdvisoryRecord]) -> Result<()>;
}

/// Local file-based storage rooted at a single directory.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.krishi/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".krishi"))
    }

    /// Ledger backing at `<root>/ledger.jsonl`.
    pub fn ledger(&self) -> FileLedger {
        FileLedger::new(self.root.join("ledger.jsonl"))
    }

    /// Advisory backing: one JSON file per subject under `<root>/advisories/`.
    pub fn advisories(&self) -> Result<FileAdvisories> {
        FileAdvisories::new(self.root.join("advisories"))
    }

    /// Advisory backing: a single SQLite database at `<root>/advisories.sqlite`.
    pub fn advisories_sqlite(&self) -> Result<SqliteAdvisories> {
        SqliteAdvisories::open(self.root.join("advisories.sqlite"))
    }
}
