//! Proposed per-partner payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Partner, PartnerId};

/// One partner's line in a settlement proposal.
///
/// `calculated_share` is the entitlement and never changes within a session.
/// `adjusted_amount` is what will actually be paid; the operator may edit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSettlementAllocation {
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub ownership_percentage: Decimal,
    pub calculated_share: Decimal,
    /// The reconciled recommendation, kept for reverting overrides.
    pub recommended_amount: Decimal,
    pub adjusted_amount: Decimal,
    /// `adjusted_amount - calculated_share`.
    pub equity_adjustment: Decimal,
    /// Partner equity when the session started.
    pub current_equity: Decimal,
    /// `current_equity + equity_adjustment`.
    pub projected_equity: Decimal,
}

impl PreSettlementAllocation {
    #[must_use]
    pub fn new(
        partner: &Partner,
        calculated_share: Decimal,
        recommended_amount: Decimal,
        current_equity: Decimal,
    ) -> Self {
        let mut allocation = Self {
            partner_id: partner.id.clone(),
            partner_name: partner.name.clone(),
            ownership_percentage: partner.ownership_percentage,
            calculated_share,
            recommended_amount,
            adjusted_amount: recommended_amount,
            equity_adjustment: Decimal::ZERO,
            current_equity,
            projected_equity: current_equity,
        };
        allocation.set_adjusted(recommended_amount);
        allocation
    }

    /// Replace the amount to pay and refresh the derived equity fields.
    pub fn set_adjusted(&mut self, amount: Decimal) {
        self.adjusted_amount = amount;
        self.equity_adjustment = amount - self.calculated_share;
        self.projected_equity = self.current_equity + self.equity_adjustment;
    }

    /// Whether the operator moved this line away from the recommendation.
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.adjusted_amount != self.recommended_amount
    }
}

/// Output of the allocation recommender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
    pub available_cash: Decimal,
    /// `round_unit(available_cash)`: what the allocations must sum to.
    pub target_total: Decimal,
    pub allocations: Vec<PreSettlementAllocation>,
    /// Cash no partner could receive. Zero unless `allocations` is empty.
    pub unallocated: Decimal,
}

impl AllocationPlan {
    #[must_use]
    pub fn allocated_total(&self) -> Decimal {
        self.allocations.iter().map(|a| a.adjusted_amount).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_adjusted_amount() {
        let partner = Partner::new("p1", "Asha", Decimal::new(40, 0));
        let mut a = PreSettlementAllocation::new(
            &partner,
            Decimal::new(100, 0),
            Decimal::new(100, 0),
            Decimal::new(-20, 0),
        );
        assert_eq!(a.equity_adjustment, Decimal::ZERO);
        assert_eq!(a.projected_equity, Decimal::new(-20, 0));
        assert!(!a.is_overridden());

        a.set_adjusted(Decimal::new(130, 0));
        assert_eq!(a.equity_adjustment, Decimal::new(30, 0));
        assert_eq!(a.projected_equity, Decimal::new(10, 0));
        assert!(a.is_overridden());
    }
}
