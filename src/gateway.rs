//! The ingestion gateway: the seam between the request layer and the
//! ledger and advisory store.
//!
//! Validates inbound event shape, classifies each event as ledger-worthy
//! or advisory-worthy, and dispatches. Malformed input is rejected before
//! either store is touched. Once the ledger fails verification the gateway
//! seals itself: every call that would append is refused until an operator
//! repairs the log and restarts (reopening re-verifies the chain).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::civil::Date;

use crate::advisory::{AdvisoryError, AdvisoryStore};
use crate::ledger::{Ledger, LedgerError};
use crate::model::{AdvisoryKind, AdvisoryRecord, Event, LedgerRecord, Resolution};

/// Errors from gateway dispatch.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed input, rejected before any store was touched.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The ledger failed verification earlier; appends are refused until
    /// operator intervention.
    #[error("ledger failed verification; refusing writes until repaired")]
    LedgerSealed,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Advisory(#[from] AdvisoryError),

    /// The advisory was stored but its audit record was not.
    #[error("advisory {advisory_id} stored, but the audit append failed: {source}")]
    AuditAppendFailed {
        advisory_id: String,
        #[source]
        source: LedgerError,
    },
}

pub type Result<T> = core::result::Result<T, GatewayError>;

/// A subsidy-eligibility decision, produced by the scheme-rules layer.
#[derive(Debug, Clone)]
pub struct SubsidyDecision {
    pub subject: String,

    /// Land holding in acres.
    pub land_acres: f64,

    pub category: String,

    /// Schemes the farmer qualified for. Empty means ineligible.
    pub schemes: Vec<String>,
}

/// An officer- or recommender-issued advisory request.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub subject: String,
    pub kind: AdvisoryKind,
    pub message: String,
    pub issued_at: Date,
}

/// Outcome of one subject in a bulk advisory send.
#[derive(Debug)]
pub struct BulkOutcome {
    pub subject: String,
    pub result: Result<AdvisoryRecord>,
}

/// Single ingestion point in front of the ledger and the advisory store.
pub struct Gateway {
    ledger: Arc<Ledger>,
    advisories: Arc<AdvisoryStore>,
    sealed: AtomicBool,
}

impl Gateway {
    pub fn new(ledger: Arc<Ledger>, advisories: Arc<AdvisoryStore>) -> Self {
        Self {
            ledger,
            advisories,
            sealed: AtomicBool::new(false),
        }
    }

    /// Records an eligible subsidy check on the ledger.
    ///
    /// An ineligible decision (no schemes granted) is not ledger-worthy
    /// and returns `Ok(None)` without touching any store.
    pub fn record_subsidy_check(
        &self,
        decision: &SubsidyDecision,
    ) -> Result<Option<LedgerRecord>> {
        validate_subject(&decision.subject)?;
        if !decision.land_acres.is_finite() || decision.land_acres < 0.0 {
            return Err(GatewayError::Validation(
                "land_acres must be a non-negative number".into(),
            ));
        }
        if decision.schemes.is_empty() {
            return Ok(None);
        }
        self.check_seal()?;
        let record = self.ledger.append(Event::SubsidyChecked {
            subject: decision.subject.clone(),
            land_acres: decision.land_acres,
            category: decision.category.clone(),
            schemes: decision.schemes.clone(),
        })?;
        Ok(Some(record))
    }

    /// Issues an advisory and records it for compliance.
    ///
    /// The one dual-store event: the advisory is created first (the audit
    /// record carries its id), then the ledger append runs. A failed
    /// append surfaces as [`GatewayError::AuditAppendFailed`] naming the
    /// stored advisory, so the caller knows exactly which step failed.
    /// Seal and validation checks run up front, before either mutation.
    pub fn issue_advisory(&self, request: &AdvisoryRequest) -> Result<AdvisoryRecord> {
        validate_subject(&request.subject)?;
        if request.message.trim().is_empty() {
            return Err(GatewayError::Validation("message must not be empty".into()));
        }
        self.check_seal()?;

        let record = self.advisories.create(
            &request.subject,
            request.kind,
            &request.message,
            request.issued_at,
        )?;
        match self.ledger.append(Event::AdvisoryIssued {
            subject: record.subject.clone(),
            advisory_id: record.id.clone(),
            kind: record.kind,
        }) {
            Ok(_) => Ok(record),
            Err(source) => Err(GatewayError::AuditAppendFailed {
                advisory_id: record.id,
                source,
            }),
        }
    }

    /// Issues the same advisory to many subjects, reporting each outcome.
    pub fn issue_bulk(
        &self,
        subjects: &[String],
        kind: AdvisoryKind,
        message: &str,
        issued_at: Date,
    ) -> Result<Vec<BulkOutcome>> {
        if subjects.is_empty() {
            return Err(GatewayError::Validation(
                "subject list must not be empty".into(),
            ));
        }
        Ok(subjects
            .iter()
            .map(|subject| BulkOutcome {
                subject: subject.clone(),
                result: self.issue_advisory(&AdvisoryRequest {
                    subject: subject.clone(),
                    kind,
                    message: message.to_string(),
                    issued_at,
                }),
            })
            .collect())
    }

    /// Applies a farmer's reported outcome to a pending advisory.
    ///
    /// A single store mutation; no ledger append, so the seal does not
    /// block farmers from resolving what they were already sent.
    pub fn resolve_advisory(
        &self,
        subject: &str,
        id: &str,
        resolution: Resolution,
    ) -> Result<AdvisoryRecord> {
        validate_subject(subject)?;
        if id.trim().is_empty() {
            return Err(GatewayError::Validation("id must not be empty".into()));
        }
        Ok(self.advisories.transition(subject, id, resolution)?)
    }

    /// Verifies the ledger chain; a failure seals the gateway.
    pub fn verify_ledger(&self) -> bool {
        let ok = self.ledger.verify();
        if !ok {
            self.sealed.store(true, Ordering::SeqCst);
        }
        ok
    }

    /// Whether appends are currently refused.
    pub fn sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    fn check_seal(&self) -> Result<()> {
        if self.sealed() {
            return Err(GatewayError::LedgerSealed);
        }
        Ok(())
    }
}

/// Subjects name on-disk history files; keep them to a safe charset.
fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() || subject.len() > 64 {
        return Err(GatewayError::Validation(
            "subject must be 1-64 characters".into(),
        ));
    }
    if !subject
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(GatewayError::Validation(
            "subject may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::model::AdvisoryStatus;
    use crate::storage::{FileLedger, MemoryAdvisories, MemoryLedger};

    fn test_gateway() -> Gateway {
        let ledger = Arc::new(Ledger::open(Box::new(MemoryLedger::new())).unwrap());
        let advisories = Arc::new(AdvisoryStore::open(Box::new(MemoryAdvisories::new())).unwrap());
        Gateway::new(ledger, advisories)
    }

    fn eligible_decision() -> SubsidyDecision {
        SubsidyDecision {
            subject: "9876500001".into(),
            land_acres: 2.5,
            category: "General".into(),
            schemes: vec!["PM-KISAN".into(), "SMAM".into()],
        }
    }

    fn advisory_request() -> AdvisoryRequest {
        AdvisoryRequest {
            subject: "9876500001".into(),
            kind: AdvisoryKind::Pest,
            message: "Spray neem oil within 2 days.".into(),
            issued_at: date(2026, 1, 10),
        }
    }

    #[test]
    fn eligible_subsidy_check_reaches_the_ledger() {
        let gateway = test_gateway();

        let record = gateway
            .record_subsidy_check(&eligible_decision())
            .unwrap()
            .unwrap();
        assert_eq!(record.index, 1);
        assert!(matches!(record.payload, Event::SubsidyChecked { .. }));
        assert!(gateway.verify_ledger());
    }

    #[test]
    fn ineligible_subsidy_check_is_not_recorded() {
        let gateway = test_gateway();

        let mut decision = eligible_decision();
        decision.schemes.clear();
        assert!(gateway.record_subsidy_check(&decision).unwrap().is_none());
        assert_eq!(gateway.ledger.snapshot().len(), 1); // genesis only
    }

    #[test]
    fn malformed_input_never_reaches_a_store() {
        let gateway = test_gateway();

        let mut decision = eligible_decision();
        decision.subject = "../etc/passwd".into();
        assert!(matches!(
            gateway.record_subsidy_check(&decision).unwrap_err(),
            GatewayError::Validation(_)
        ));

        let mut request = advisory_request();
        request.message = "  ".into();
        assert!(matches!(
            gateway.issue_advisory(&request).unwrap_err(),
            GatewayError::Validation(_)
        ));

        assert_eq!(gateway.ledger.snapshot().len(), 1);
        assert!(gateway.advisories.history("9876500001", 10).is_empty());
    }

    #[test]
    fn issue_advisory_writes_both_stores_in_order() {
        let gateway = test_gateway();

        let record = gateway.issue_advisory(&advisory_request()).unwrap();
        assert_eq!(record.status, AdvisoryStatus::Pending);

        let chain = gateway.ledger.snapshot();
        let tail = chain.last().unwrap();
        match &tail.payload {
            Event::AdvisoryIssued {
                subject,
                advisory_id,
                kind,
            } => {
                assert_eq!(subject, "9876500001");
                assert_eq!(advisory_id, &record.id);
                assert_eq!(*kind, AdvisoryKind::Pest);
            }
            other => panic!("unexpected tail payload: {other:?}"),
        }
    }

    #[test]
    fn issue_bulk_reports_each_subject() {
        let gateway = test_gateway();

        let subjects = vec![
            "9876500001".to_string(),
            "not a subject!".to_string(),
            "9876500002".to_string(),
        ];
        let outcomes = gateway
            .issue_bulk(&subjects, AdvisoryKind::Weather, "Hailstorm expected.", date(2026, 1, 10))
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(GatewayError::Validation(_))
        ));
        assert!(outcomes[2].result.is_ok());
    }

    #[test]
    fn resolve_advisory_distinguishes_conflict_from_missing() {
        let gateway = test_gateway();
        let record = gateway.issue_advisory(&advisory_request()).unwrap();

        gateway
            .resolve_advisory("9876500001", &record.id, Resolution::Followed)
            .unwrap();

        let conflict = gateway
            .resolve_advisory("9876500001", &record.id, Resolution::Ignored)
            .unwrap_err();
        assert!(matches!(
            conflict,
            GatewayError::Advisory(AdvisoryError::AlreadyResolved { .. })
        ));

        let missing = gateway
            .resolve_advisory("9876500001", "999_9876500001", Resolution::Ignored)
            .unwrap_err();
        assert!(matches!(
            missing,
            GatewayError::Advisory(AdvisoryError::NotFound { .. })
        ));
    }

    #[test]
    fn failed_verification_seals_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let ledger = Arc::new(Ledger::open(Box::new(FileLedger::new(path.clone()))).unwrap());
        let advisories = Arc::new(AdvisoryStore::open(Box::new(MemoryAdvisories::new())).unwrap());
        let gateway = Gateway::new(ledger, advisories);
        gateway.record_subsidy_check(&eligible_decision()).unwrap();

        // Corrupt the log underneath the running process.
        fs::write(&path, "{\"not\": \"a record\"}\n").unwrap();

        assert!(!gateway.verify_ledger());
        assert!(gateway.sealed());
        assert!(matches!(
            gateway.record_subsidy_check(&eligible_decision()),
            Err(GatewayError::LedgerSealed)
        ));
        assert!(matches!(
            gateway.issue_advisory(&advisory_request()),
            Err(GatewayError::LedgerSealed)
        ));
        // Resolving already-issued advisories is still allowed: the seal
        // only refuses appends.
        assert!(matches!(
            gateway.resolve_advisory("9876500001", "1_9876500001", Resolution::Followed),
            Err(GatewayError::Advisory(AdvisoryError::NotFound { .. }))
        ));
    }
}
