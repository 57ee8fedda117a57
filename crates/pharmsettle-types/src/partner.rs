//! Partner directory and payable snapshot types.
//!
//! Both are supplied by collaborators outside the engine: the partner
//! directory owns identities and ownership, the payable aggregator turns raw
//! transactions into per-partner earned/paid totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::PartnerId;

/// An ownership-bearing stakeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    /// 0–100. Not required to sum to 100 across partners.
    pub ownership_percentage: Decimal,
}

impl Partner {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, ownership_percentage: Decimal) -> Self {
        Self {
            id: PartnerId::new(id),
            name: name.into(),
            ownership_percentage,
        }
    }

    /// Only partners holding some ownership take part in settlements.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.ownership_percentage > Decimal::ZERO
    }
}

/// Cumulative earned/paid figures for one partner as of "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPayable {
    pub stakeholder_id: PartnerId,
    pub stakeholder_name: String,
    pub total_earned: Decimal,
    pub total_paid: Decimal,
    /// `total_earned - total_paid`; may be negative when a partner was overpaid.
    pub net_payable: Decimal,
}

impl PartnerPayable {
    /// Build a payable from earned/paid totals.
    #[must_use]
    pub fn from_totals(
        stakeholder_id: PartnerId,
        stakeholder_name: impl Into<String>,
        total_earned: Decimal,
        total_paid: Decimal,
    ) -> Self {
        Self {
            stakeholder_id,
            stakeholder_name: stakeholder_name.into(),
            total_earned,
            total_paid,
            net_payable: total_earned - total_paid,
        }
    }

    /// Net payable clamped at zero.
    #[must_use]
    pub fn owed(&self) -> Decimal {
        self.net_payable.max(Decimal::ZERO)
    }
}
