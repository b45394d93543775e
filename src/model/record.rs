//! Ledger records: the hash-linked entries of the audit chain.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Event;

/// The `previous_hash` carried by the record at index 0.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// One entry in the audit chain.
///
/// Immutable once appended: `hash` covers every other field and
/// `previous_hash` links to the predecessor, so any edit to a stored
/// record is detectable by recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    /// 0-based position in the chain. Strictly increasing, no gaps.
    pub index: u64,

    pub timestamp: Timestamp,

    pub payload: Event,

    /// Hash of the record at `index - 1`, or [`GENESIS_PREVIOUS_HASH`]
    /// at index 0.
    pub previous_hash: String,

    /// Lowercase hex SHA-256 over the canonical serialization of the
    /// other four fields.
    pub hash: String,
}

/// Canonical hash input: the linked fields in a fixed order.
///
/// The declaration order of these fields *is* the canonicalization rule.
/// Serde serializes struct fields in declaration order, `Event` is a
/// tagged enum whose variants also serialize field-by-field in declaration
/// order, and no maps appear anywhere in hashed data — so the serialized
/// bytes are reproducible across runs, restarts, and implementations.
#[derive(Serialize)]
struct HashInput<'a> {
    index: u64,
    payload: &'a Event,
    previous_hash: &'a str,
    timestamp: &'a Timestamp,
}

impl LedgerRecord {
    /// The hash this record should carry, recomputed from its other fields.
    pub fn expected_hash(&self) -> Result<String, serde_json::Error> {
        compute_hash(
            self.index,
            &self.payload,
            &self.previous_hash,
            &self.timestamp,
        )
    }
}

/// Hashes the canonical serialization of one record's linked fields.
pub fn compute_hash(
    index: u64,
    payload: &Event,
    previous_hash: &str,
    timestamp: &Timestamp,
) -> Result<String, serde_json::Error> {
    let input = HashInput {
        index,
        payload,
        previous_hash,
        timestamp,
    };
    let json = serde_json::to_string(&input)?;
    Ok(hex::encode(Sha256::digest(json.as_bytes())))
}
