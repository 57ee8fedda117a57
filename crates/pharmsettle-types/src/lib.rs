//! # pharmsettle-types
//!
//! Shared types, errors, and configuration for the **PharmSettle** partner
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`PartnerId`], [`SessionId`], [`SettlementId`], [`TransactionId`]
//! - **Inputs**: [`Partner`], [`PartnerPayable`]
//! - **Equity model**: [`PartnerEquity`], [`SettlementRecord`]
//! - **Proposal model**: [`PreSettlementAllocation`], [`AllocationPlan`]
//! - **Session model**: [`SettlementSession`], [`SessionState`]
//! - **Outputs**: [`TransactionRequest`], [`TransactionCategory`]
//! - **Validation**: [`SettlementValidation`], [`ValidationIssue`]
//! - **Configuration**: [`AllocationPolicy`], [`EngineConfig`]
//! - **Errors**: [`SettleError`] with `PS_ERR_` prefix codes
//! - **Money**: [`round_unit`]

pub mod allocation;
pub mod config;
pub mod constants;
pub mod equity;
pub mod error;
pub mod ids;
pub mod money;
pub mod partner;
pub mod session;
pub mod transaction;
pub mod validation;

pub use allocation::*;
pub use config::*;
pub use equity::*;
pub use error::*;
pub use ids::*;
pub use money::*;
pub use partner::*;
pub use session::*;
pub use transaction::*;
pub use validation::*;

// Constants are accessed via `pharmsettle_types::constants::FOO`
// (not re-exported to avoid name collisions).
