//! # pharmsettle-settlement
//!
//! **Settlement desk**: session lifecycle, validation, and the
//! all-or-nothing commit.
//!
//! ## Flow
//!
//! 1. [`SettlementDesk::initialize`] seeds equity records, reads payables and
//!    equity, and opens an ACTIVE session with a reconciled proposal
//! 2. The operator overrides lines with [`SettlementDesk::update_allocation`]
//! 3. [`validate`] gates commit: exact sum, no negatives
//! 4. [`SettlementCommitter`] emits distribution transactions and the
//!    settlement point, then applies the settlement to the equity ledger
//!
//! Collaborators are reached through the traits in [`sources`]; the
//! in-memory implementations there are used by the tests and for embedding.

pub mod committer;
pub mod desk;
pub mod sources;
pub mod validator;

pub use committer::{SettlementCommitter, SettlementReceipt, settlement_digest};
pub use desk::SettlementDesk;
pub use sources::{
    InMemoryTransactionLedger, PartnerDirectory, PayableSource, RecordedTransaction,
    StaticDirectory, StaticPayables, TransactionLedger,
};
pub use validator::validate;
