//! Error types for the PharmSettle settlement engine.
//!
//! All errors use the `PS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Allocation errors
//! - 3xx: Session errors
//! - 4xx: Ledger / persistence errors
//! - 5xx: Transaction ledger errors
//! - 9xx: General errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{PartnerId, SessionState, SettlementId, ValidationIssue};

/// Central error enum for all PharmSettle operations.
#[derive(Debug, Error)]
pub enum SettleError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The session failed validation and cannot be committed.
    #[error("PS_ERR_100: Settlement validation failed: {}", join_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    /// Available cash must be zero or positive.
    #[error("PS_ERR_101: Invalid available cash: {0}")]
    InvalidCash(Decimal),

    /// An operator override is unusable (negative after rounding).
    #[error("PS_ERR_102: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Allocation Errors (2xx)
    // =================================================================
    /// No ownership-bearing partner exists. Not fatal: nothing to settle.
    #[error("PS_ERR_200: No eligible partners; {unallocated} left unallocated")]
    NoEligiblePartners { unallocated: Decimal },

    // =================================================================
    // Session Errors (3xx)
    // =================================================================
    /// `initialize` was called while another session is still active.
    #[error("PS_ERR_300: Settlement already in progress")]
    ConcurrentSettlement,

    /// The operation requires an ACTIVE session.
    #[error("PS_ERR_301: Session is {state}, expected ACTIVE")]
    SessionNotActive { state: SessionState },

    /// No session has been initialized on this desk.
    #[error("PS_ERR_302: No settlement session")]
    NoSession,

    /// The partner has no allocation in the current session.
    #[error("PS_ERR_303: Partner not in session: {0}")]
    PartnerNotInSession(PartnerId),

    // =================================================================
    // Ledger / Persistence Errors (4xx)
    // =================================================================
    /// The equity ledger could not be loaded or saved.
    #[error("PS_ERR_400: Persistence error: {0}")]
    Persistence(String),

    /// This settlement has already been applied to the equity ledger.
    #[error("PS_ERR_401: Settlement already applied: {0}")]
    SettlementAlreadyApplied(SettlementId),

    /// A partner's equity no longer matches its settlement history.
    #[error("PS_ERR_402: Equity invariant violation: {reason}")]
    EquityInvariantViolation { reason: String },

    // =================================================================
    // Transaction Ledger Errors (5xx)
    // =================================================================
    /// The external transaction ledger refused a request.
    #[error("PS_ERR_500: Transaction rejected: {reason}")]
    TransactionRejected { reason: String },

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Configuration error (invalid config file, bad ratios, etc.).
    #[error("PS_ERR_900: Configuration error: {0}")]
    Configuration(String),
}

impl SettleError {
    /// Whether the error is a recoverable validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidCash(_) | Self::InvalidAmount { .. }
        )
    }

    /// Whether the error came from loading or saving the equity ledger.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SettleError>;

impl From<std::io::Error> for SettleError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
