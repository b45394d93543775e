//! The advisory store: per-farmer histories with a one-shot outcome.
//!
//! Each subject's history is an insertion-ordered sequence of advisories.
//! Mutations are scoped per subject: a writer holds the subject map's read
//! lock plus that one subject's mutex, so different subjects proceed in
//! parallel while same-subject operations serialize. [`AdvisoryStore::snapshot`]
//! takes the map's write lock instead, which waits out every in-flight
//! writer — a point-in-time copy without ever holding two subject locks.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use jiff::civil::Date;

use crate::model::{AdvisoryKind, AdvisoryRecord, AdvisoryStatus, Resolution};
use crate::storage::{AdvisoryBacking, StorageError};

/// Errors from advisory-store operations.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// No advisory with this id exists for this subject.
    #[error("advisory {id} not found for {subject}")]
    NotFound { subject: String, id: String },

    /// The advisory was already resolved; transitions are one-shot.
    #[error("advisory {id} already resolved as {status}")]
    AlreadyResolved { id: String, status: AdvisoryStatus },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, AdvisoryError>;

type History = Arc<Mutex<Vec<AdvisoryRecord>>>;

/// Per-subject advisory histories with durable persistence.
pub struct AdvisoryStore {
    backing: Box<dyn AdvisoryBacking>,
    subjects: RwLock<HashMap<String, History>>,
    next_seq: AtomicU64,
}

impl AdvisoryStore {
    /// Opens the store, loading every subject's history from the backing.
    ///
    /// The id counter resumes past the highest sequence found on disk, so
    /// ids stay unique across restarts.
    pub fn open(backing: Box<dyn AdvisoryBacking>) -> Result<Self> {
        let histories = backing.load()?;
        let next_seq = histories
            .values()
            .flatten()
            .filter_map(|record| record.id.split('_').next()?.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        let subjects = histories
            .into_iter()
            .map(|(subject, history)| (subject, Arc::new(Mutex::new(history))))
            .collect();
        Ok(Self {
            backing,
            subjects: RwLock::new(subjects),
            next_seq: AtomicU64::new(next_seq),
        })
    }

    /// Issues a new advisory: status `pending`, id unique within the store.
    ///
    /// The subject's history is persisted before the record is returned.
    pub fn create(
        &self,
        subject: &str,
        kind: AdvisoryKind,
        message: &str,
        issued_at: Date,
    ) -> Result<AdvisoryRecord> {
        // Fast path: the subject already has a history. The map read lock
        // stays held until return so `snapshot` cannot run mid-mutation.
        {
            let subjects = self.read_subjects();
            if let Some(history) = subjects.get(subject) {
                let history = Arc::clone(history);
                return self.push_record(subject, &history, kind, message, issued_at);
            }
        }

        // First advisory for this subject: insert under the write lock and
        // keep holding it through the mutation.
        let mut subjects = self
            .subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let history = Arc::clone(subjects.entry(subject.to_string()).or_default());
        self.push_record(subject, &history, kind, message, issued_at)
    }

    /// Resolves a pending advisory to `followed` or `ignored`.
    ///
    /// One-shot: the check-then-set runs under the subject's lock, so of
    /// two racing transitions exactly one wins and the other observes
    /// [`AdvisoryError::AlreadyResolved`].
    pub fn transition(
        &self,
        subject: &str,
        id: &str,
        resolution: Resolution,
    ) -> Result<AdvisoryRecord> {
        let subjects = self.read_subjects();
        let Some(history) = subjects.get(subject) else {
            return Err(AdvisoryError::NotFound {
                subject: subject.to_string(),
                id: id.to_string(),
            });
        };
        let history = Arc::clone(history);
        let mut history = lock(&history);

        let Some(record) = history.iter_mut().find(|r| r.id == id) else {
            return Err(AdvisoryError::NotFound {
                subject: subject.to_string(),
                id: id.to_string(),
            });
        };
        if record.status != AdvisoryStatus::Pending {
            return Err(AdvisoryError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        record.status = resolution.into();
        let updated = record.clone();
        if let Err(e) = self.backing.save_subject(subject, &history) {
            // The outcome only exists once it is durable.
            if let Some(record) = history.iter_mut().find(|r| r.id == id) {
                record.status = AdvisoryStatus::Pending;
            }
            return Err(e.into());
        }
        Ok(updated)
    }

    /// The most recent `limit` advisories, oldest-first within the window.
    ///
    /// Unknown subjects yield an empty history, not an error.
    pub fn history(&self, subject: &str, limit: usize) -> Vec<AdvisoryRecord> {
        let subjects = self.read_subjects();
        let Some(history) = subjects.get(subject) else {
            return Vec::new();
        };
        let history = lock(history);
        let start = history.len().saturating_sub(limit);
        history[start..].to_vec()
    }

    /// A point-in-time copy of every subject's history.
    ///
    /// Writers hold the map read lock for their whole mutation, so taking
    /// the write lock here excludes every in-flight writer: no history is
    /// observed mid-mutation and no cross-subject skew is possible.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<AdvisoryRecord>> {
        let subjects = self
            .subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subjects
            .iter()
            .map(|(subject, history)| (subject.clone(), lock(history).clone()))
            .collect()
    }

    fn push_record(
        &self,
        subject: &str,
        history: &Mutex<Vec<AdvisoryRecord>>,
        kind: AdvisoryKind,
        message: &str,
        issued_at: Date,
    ) -> Result<AdvisoryRecord> {
        let mut history = lock(history);
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = AdvisoryRecord {
            id: format!("{seq}_{subject}"),
            subject: subject.to_string(),
            kind,
            message: message.to_string(),
            issued_at,
            status: AdvisoryStatus::Pending,
        };
        history.push(record.clone());
        if let Err(e) = self.backing.save_subject(subject, &history) {
            // The record only exists once it is durable.
            history.pop();
            return Err(e.into());
        }
        Ok(record)
    }

    fn read_subjects(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, History>> {
        self.subjects.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock(history: &Mutex<Vec<AdvisoryRecord>>) -> MutexGuard<'_, Vec<AdvisoryRecord>> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Barrier;
    use std::thread;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::storage::{FileAdvisories, MemoryAdvisories, SqliteAdvisories};

    fn test_store() -> AdvisoryStore {
        AdvisoryStore::open(Box::new(MemoryAdvisories::new())).unwrap()
    }

    fn issue(store: &AdvisoryStore, subject: &str, day: i8) -> AdvisoryRecord {
        store
            .create(
                subject,
                AdvisoryKind::Pest,
                "Spray neem oil within 2 days.",
                date(2026, 1, day),
            )
            .unwrap()
    }

    #[test]
    fn create_starts_pending_with_unique_ids() {
        let store = test_store();

        let first = issue(&store, "9876500001", 10);
        let second = issue(&store, "9876500001", 11);

        assert_eq!(first.status, AdvisoryStatus::Pending);
        assert_ne!(first.id, second.id);
        assert!(first.id.ends_with("_9876500001"));
    }

    #[test]
    fn transition_resolves_once() {
        let store = test_store();
        let record = issue(&store, "9876500001", 10);

        let updated = store
            .transition("9876500001", &record.id, Resolution::Followed)
            .unwrap();
        assert_eq!(updated.status, AdvisoryStatus::Followed);

        let err = store
            .transition("9876500001", &record.id, Resolution::Ignored)
            .unwrap_err();
        assert!(matches!(
            err,
            AdvisoryError::AlreadyResolved {
                status: AdvisoryStatus::Followed,
                ..
            }
        ));
    }

    #[test]
    fn transition_unknown_subject_fails() {
        let store = test_store();
        let err = store
            .transition("9876509999", "1_9876509999", Resolution::Followed)
            .unwrap_err();

        assert!(matches!(err, AdvisoryError::NotFound { .. }));
    }

    #[test]
    fn transition_unknown_id_fails() {
        let store = test_store();
        issue(&store, "9876500001", 10);

        let err = store
            .transition("9876500001", "999_9876500001", Resolution::Followed)
            .unwrap_err();
        assert!(matches!(err, AdvisoryError::NotFound { .. }));
    }

    #[test]
    fn concurrent_transitions_have_one_winner() {
        let store = Arc::new(test_store());
        let record = issue(&store, "9876500001", 10);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [Resolution::Followed, Resolution::Ignored]
            .into_iter()
            .map(|resolution| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                let id = record.id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    store.transition("9876500001", &id, resolution)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
        assert_eq!(winners.len(), 1);
        let winner_status = winners[0].as_ref().unwrap().status;
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AdvisoryError::AlreadyResolved { status, .. }) if *status == winner_status
        )));

        // The stored status matches the winner.
        let stored = store.history("9876500001", 1);
        assert_eq!(stored[0].status, winner_status);
    }

    #[test]
    fn history_windows_latest_oldest_first() {
        let store = test_store();
        for day in 1..=5 {
            issue(&store, "9876500001", day);
        }

        let window = store.history("9876500001", 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].issued_at, date(2026, 1, 4));
        assert_eq!(window[1].issued_at, date(2026, 1, 5));
    }

    #[test]
    fn history_unknown_subject_is_empty() {
        let store = test_store();
        assert!(store.history("9876509999", 10).is_empty());
    }

    #[test]
    fn snapshot_copies_every_subject() {
        let store = test_store();
        issue(&store, "9876500001", 10);
        issue(&store, "9876500002", 11);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["9876500001"].len(), 1);
    }

    #[test]
    fn reload_preserves_statuses_and_id_monotonicity() {
        let dir = TempDir::new().unwrap();
        let open = || {
            AdvisoryStore::open(Box::new(
                FileAdvisories::new(dir.path().join("advisories")).unwrap(),
            ))
            .unwrap()
        };

        let first_id;
        {
            let store = open();
            first_id = issue(&store, "9876500001", 10).id;
            issue(&store, "9876500001", 11);
            store
                .transition("9876500001", &first_id, Resolution::Ignored)
                .unwrap();
        }

        let store = open();
        let history = store.history("9876500001", 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, AdvisoryStatus::Ignored);
        assert_eq!(history[1].status, AdvisoryStatus::Pending);

        // New ids keep counting past everything on disk.
        let next = issue(&store, "9876500001", 12);
        let seq_of = |id: &str| id.split('_').next().unwrap().parse::<u64>().unwrap();
        assert!(seq_of(&next.id) > seq_of(&history[1].id));
    }

    #[test]
    fn sqlite_backing_round_trips() {
        let dir = TempDir::new().unwrap();
        let open = || {
            AdvisoryStore::open(Box::new(
                SqliteAdvisories::open(dir.path().join("advisories.sqlite")).unwrap(),
            ))
            .unwrap()
        };

        let id;
        {
            let store = open();
            id = issue(&store, "9876500001", 10).id;
            store
                .transition("9876500001", &id, Resolution::Followed)
                .unwrap();
        }

        let store = open();
        let history = store.history("9876500001", 10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].status, AdvisoryStatus::Followed);
    }
}
