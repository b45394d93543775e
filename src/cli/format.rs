//! Output formatting for CLI display.

use crate::analytics::PriorityEntry;
use crate::gateway::BulkOutcome;
use crate::model::AdvisoryRecord;

/// One advisory as a history line.
pub(super) fn format_advisory_line(record: &AdvisoryRecord) -> String {
    format!(
        "{}  {}  [{}/{}]  {}",
        record.id,
        record.issued_at,
        record.kind.as_str(),
        record.status.as_str(),
        record.message
    )
}

/// One priority-list entry for the officer report.
pub(super) fn format_priority_entry(entry: &PriorityEntry) -> String {
    format!(
        "{}  risk {:>3}  {}  ({})",
        entry.subject, entry.risk_score, entry.reason, entry.location
    )
}

/// One per-subject line of a bulk send report.
pub(super) fn format_bulk_outcome(outcome: &BulkOutcome) -> String {
    match &outcome.result {
        Ok(record) => format!("{}  sent ({})", outcome.subject, record.id),
        Err(e) => format!("{}  FAILED: {e}", outcome.subject),
    }
}
