//! # pharmsettle-ledger
//!
//! Durable per-partner **equity ledger**.
//!
//! Each partner's record carries all-time owed, all-time received, the
//! signed running equity (Σ actual − owed), and the full settlement history.
//! Records are created zeroed the first time a partner is observed and are
//! mutated only by applying a committed settlement; they are never deleted.
//!
//! Persistence goes through the [`EquityStore`] seam:
//! - [`MemoryStore`]: volatile, for tests and embedding
//! - [`JsonFileStore`]: versioned JSON document with atomic replace

pub mod equity_ledger;
pub mod json_store;
pub mod store;

pub use equity_ledger::{EquityLedger, LedgerSummary};
pub use json_store::JsonFileStore;
pub use store::{EquityStore, MemoryStore};
