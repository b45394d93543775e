//! Advisory types: recommendations issued to farmers, with tracked outcomes.

use std::fmt;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// A recommendation issued to one farmer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRecord {
    /// `"{seq}_{subject}"` — unique within the store, immutable once assigned.
    pub id: String,

    /// The farmer this advisory was issued to.
    pub subject: String,

    pub kind: AdvisoryKind,

    pub message: String,

    pub issued_at: Date,

    pub status: AdvisoryStatus,
}

/// What an advisory is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvisoryKind {
    Irrigation,
    Fertilizer,
    Pesticide,
    Weather,
    Pest,
}

impl AdvisoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Irrigation => "irrigation",
            Self::Fertilizer => "fertilizer",
            Self::Pesticide => "pesticide",
            Self::Weather => "weather",
            Self::Pest => "pest",
        }
    }
}

/// Where an advisory stands in its lifecycle.
///
/// Starts at `Pending` and transitions at most once, to `Followed` or
/// `Ignored`. No transition is reversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvisoryStatus {
    Pending,
    Followed,
    Ignored,
}

impl AdvisoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Followed => "followed",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for AdvisoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome a farmer reports for a pending advisory.
///
/// Separate from [`AdvisoryStatus`] so a transition back to `Pending`
/// cannot even be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Followed,
    Ignored,
}

impl From<Resolution> for AdvisoryStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Followed => Self::Followed,
            Resolution::Ignored => Self::Ignored,
        }
    }
}
