//! Settlement validator: the gate in front of commit.
//!
//! A session may be committed only if:
//! ```text
//! state == ACTIVE
//! Σ adjusted_amount == round(available_cash)      (exact, no tolerance)
//! ∀ allocation: adjusted_amount >= 0
//! ```
//! Zero-amount allocations are allowed. Every violated condition is
//! reported, not just the first.

use pharmsettle_types::{SettlementSession, SettlementValidation, ValidationIssue};
use rust_decimal::Decimal;

/// Check every commit precondition of `session`.
#[must_use]
pub fn validate(session: &SettlementSession) -> SettlementValidation {
    let mut issues = Vec::new();

    if !session.is_active() {
        issues.push(ValidationIssue::NotActive {
            state: session.state,
        });
    }

    let allocated = session.allocated_total();
    let expected = session.target_total();
    if allocated != expected {
        issues.push(ValidationIssue::SumMismatch {
            allocated,
            expected,
        });
    }

    issues.extend(
        session
            .allocations
            .iter()
            .filter(|a| a.adjusted_amount < Decimal::ZERO)
            .map(|a| ValidationIssue::NegativeAmount {
                partner_id: a.partner_id.clone(),
                amount: a.adjusted_amount,
            }),
    );

    SettlementValidation::from_issues(issues)
}
