//! Event payloads: what each ledger record attests to.

use serde::{Deserialize, Serialize};

use super::AdvisoryKind;

/// Payload of one ledger record.
///
/// Tagged enum so each persisted line is self-describing when read back.
/// Variants carry no maps — canonical hashing relies on declaration-order
/// serialization (see `model::record`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// The fixed first entry every chain starts from.
    Genesis,

    /// A subsidy-eligibility check that found the farmer eligible.
    #[serde(rename_all = "camelCase")]
    SubsidyChecked {
        subject: String,
        land_acres: f64,
        category: String,
        /// Schemes the farmer qualified for. Non-empty by construction:
        /// ineligible checks never reach the ledger.
        schemes: Vec<String>,
    },

    /// An advisory was issued; recorded for compliance review.
    #[serde(rename_all = "camelCase")]
    AdvisoryIssued {
        subject: String,
        advisory_id: String,
        kind: AdvisoryKind,
    },
}
