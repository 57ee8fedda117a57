//! Reasons a settlement proposal cannot be committed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PartnerId, SessionState};

/// A single violated commit precondition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationIssue {
    /// Allocations do not add up to the rounded available cash.
    SumMismatch { allocated: Decimal, expected: Decimal },
    /// A partner is set to receive a negative amount.
    NegativeAmount { partner_id: PartnerId, amount: Decimal },
    /// The session is no longer open.
    NotActive { state: SessionState },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SumMismatch {
                allocated,
                expected,
            } => write!(
                f,
                "allocated total {allocated} does not equal available cash {expected} (difference {})",
                expected - allocated
            ),
            Self::NegativeAmount { partner_id, amount } => {
                write!(f, "partner {partner_id} has negative amount {amount}")
            }
            Self::NotActive { state } => write!(f, "session is {state}"),
        }
    }
}

/// Outcome of validating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementValidation {
    pub can_process: bool,
    pub issues: Vec<ValidationIssue>,
}

impl SettlementValidation {
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            can_process: issues.is_empty(),
            issues,
        }
    }

    /// Human-readable messages, one per issue.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}
