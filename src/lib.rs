//! Advisory lifecycle and integrity ledger for agricultural extension
//! programs.
//!
//! The crate tracks three things for an extension deployment:
//!
//! - an append-only, hash-linked audit [`ledger`] of eligibility and
//!   compliance events;
//! - per-farmer [`advisory`] histories with a one-shot
//!   pending → followed/ignored outcome;
//! - officer-facing [`analytics`] computed fresh from store snapshots.
//!
//! The [`gateway`] module is the single ingestion seam: the embedding API
//! layer calls it with classified requests, and it validates, dispatches
//! to the right store, and fails closed once the ledger stops verifying.
//! [`storage`] hides persistence behind small backing traits so every
//! component also runs against in-memory backings in tests.

pub mod advisory;
pub mod analytics;
pub mod cli;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod model;
pub mod storage;
