//! Farmer profile signals, supplied by the enrollment and prediction layers.
//!
//! Read-only to this crate: risk scores and crop labels are produced
//! elsewhere and only rank or bucket farmers here. Nothing in the core
//! mutates or persists them.

use serde::{Deserialize, Serialize};

/// One farmer's profile signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    /// Farmer identifier. Matches advisory-store subjects.
    pub subject: String,

    pub location: String,

    pub crop_type: String,

    /// Pest and disease risk prediction, 0–100.
    pub risk_score: u8,
}
