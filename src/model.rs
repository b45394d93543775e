//! Core data model for Krishi.
//!
//! These types represent the conceptual architecture:
//! ledger records and their event payloads, advisories with a tracked
//! outcome, and the read-only farmer profile signals used for ranking.

mod advisory;
mod event;
mod profile;
mod record;

pub use advisory::{AdvisoryKind, AdvisoryRecord, AdvisoryStatus, Resolution};
pub use event::Event;
pub use profile::FarmerProfile;
pub use record::{GENESIS_PREVIOUS_HASH, LedgerRecord, compute_hash};
