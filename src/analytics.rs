//! Officer-facing aggregation over advisory histories.
//!
//! Everything here recomputes from a snapshot on every query; nothing is
//! cached across mutations. The free functions are the ground-truth
//! semantics — [`Aggregator`] just binds them to a live store.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::advisory::AdvisoryStore;
use crate::model::{AdvisoryRecord, AdvisoryStatus, FarmerProfile};

/// A farmer flagged for officer follow-up. Derived per query, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityEntry {
    pub subject: String,
    pub location: String,
    pub risk_score: u8,
    pub ignored_count: usize,
    pub reason: String,
}

/// Priority list plus the headline metrics shown next to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficerOverview {
    pub priority: Vec<PriorityEntry>,

    /// Adoption rate rounded to one decimal for presentation.
    pub adoption_rate: f64,

    pub total_farmers: usize,
}

type Snapshot = BTreeMap<String, Vec<AdvisoryRecord>>;

/// Read path over a consistent advisory-store snapshot.
pub struct Aggregator {
    store: Arc<AdvisoryStore>,
}

impl Aggregator {
    pub fn new(store: Arc<AdvisoryStore>) -> Self {
        Self { store }
    }

    /// Unrounded adoption rate over the store's current state.
    pub fn adoption_rate(&self) -> f64 {
        adoption_rate(&self.store.snapshot())
    }

    /// Farmers needing attention, riskiest first, truncated to `top_n`.
    pub fn prioritize(&self, profiles: &[FarmerProfile], top_n: usize) -> Vec<PriorityEntry> {
        prioritize(&self.store.snapshot(), profiles, top_n)
    }

    /// Share of farmers per crop label.
    pub fn crop_distribution(&self, profiles: &[FarmerProfile]) -> BTreeMap<String, f64> {
        crop_distribution(profiles)
    }

    /// Priority list and headline metrics from a single snapshot.
    pub fn overview(&self, profiles: &[FarmerProfile], top_n: usize) -> OfficerOverview {
        let snapshot = self.store.snapshot();
        OfficerOverview {
            priority: prioritize(&snapshot, profiles, top_n),
            adoption_rate: round1(adoption_rate(&snapshot)),
            total_farmers: profiles.len(),
        }
    }
}

/// `followed / (followed + ignored) * 100`, unrounded.
///
/// Pending advisories are excluded from the denominator. With nothing
/// resolved the rate is 0, not an error.
pub fn adoption_rate(snapshot: &Snapshot) -> f64 {
    let mut followed = 0u32;
    let mut resolved = 0u32;
    for record in snapshot.values().flatten() {
        match record.status {
            AdvisoryStatus::Followed => {
                followed += 1;
                resolved += 1;
            }
            AdvisoryStatus::Ignored => resolved += 1,
            AdvisoryStatus::Pending => {}
        }
    }
    if resolved == 0 {
        return 0.0;
    }
    f64::from(followed) / f64::from(resolved) * 100.0
}

/// Farmers needing attention, riskiest first.
///
/// A profile is flagged when its risk score is above 60 or it has at
/// least one ignored advisory. The sort is stable, so equal scores keep
/// their profile input order.
pub fn prioritize(
    snapshot: &Snapshot,
    profiles: &[FarmerProfile],
    top_n: usize,
) -> Vec<PriorityEntry> {
    let mut entries: Vec<PriorityEntry> = profiles
        .iter()
        .filter_map(|profile| {
            let ignored_count = snapshot.get(&profile.subject).map_or(0, |history| {
                history
                    .iter()
                    .filter(|r| r.status == AdvisoryStatus::Ignored)
                    .count()
            });
            if profile.risk_score <= 60 && ignored_count == 0 {
                return None;
            }
            let reason = if ignored_count >= 1 {
                format!("{ignored_count} Ignored Advisories")
            } else {
                "High Pest Risk Prediction".to_string()
            };
            Some(PriorityEntry {
                subject: profile.subject.clone(),
                location: profile.location.clone(),
                risk_score: profile.risk_score,
                ignored_count,
                reason,
            })
        })
        .collect();
    entries.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    entries.truncate(top_n);
    entries
}

/// Percentage of profiles per crop label, each rounded to one decimal.
///
/// Percentages are rounded independently; their sum may drift from 100.
pub fn crop_distribution(profiles: &[FarmerProfile]) -> BTreeMap<String, f64> {
    if profiles.is_empty() {
        return BTreeMap::new();
    }
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for profile in profiles {
        *counts.entry(profile.crop_type.clone()).or_default() += 1;
    }
    let total = profiles.len() as f64;
    counts
        .into_iter()
        .map(|(crop, count)| (crop, round1(f64::from(count) / total * 100.0)))
        .collect()
}

/// Rounds to one decimal place for presentation.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
