//! Per-partner equity records.
//!
//! Equity is the signed running total of `actual - owed` across every
//! settlement a partner took part in. A record is created zeroed the first
//! time a partner is observed and is only ever mutated by a committed
//! settlement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Partner, PartnerId, PreSettlementAllocation, SettlementId};

/// One line of a partner's settlement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub settlement_id: SettlementId,
    pub settlement_date: DateTime<Utc>,
    /// The entitlement at the time (`calculated_share`).
    pub owed_amount: Decimal,
    /// What was actually paid (`adjusted_amount`).
    pub actual_amount: Decimal,
    /// `actual_amount - owed_amount`.
    pub equity_change: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Durable equity state for one partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEquity {
    pub partner_id: PartnerId,
    pub partner_name: String,
    /// Ownership at the last time this record was touched.
    pub ownership_percentage: Decimal,
    pub total_owed_all_time: Decimal,
    pub total_received_all_time: Decimal,
    /// Signed; equals the sum of every `equity_change` in the history.
    pub current_equity: Decimal,
    pub settlement_history: Vec<SettlementRecord>,
    pub last_updated: DateTime<Utc>,
}

impl PartnerEquity {
    /// A fresh, zero-initialized record.
    #[must_use]
    pub fn zeroed(partner: &Partner, now: DateTime<Utc>) -> Self {
        Self {
            partner_id: partner.id.clone(),
            partner_name: partner.name.clone(),
            ownership_percentage: partner.ownership_percentage,
            total_owed_all_time: Decimal::ZERO,
            total_received_all_time: Decimal::ZERO,
            current_equity: Decimal::ZERO,
            settlement_history: Vec::new(),
            last_updated: now,
        }
    }

    /// Fold one settlement allocation into this record.
    pub fn apply(
        &mut self,
        allocation: &PreSettlementAllocation,
        settlement_id: SettlementId,
        settlement_date: DateTime<Utc>,
        reason: Option<&str>,
    ) {
        let equity_change = allocation.adjusted_amount - allocation.calculated_share;
        self.settlement_history.push(SettlementRecord {
            settlement_id,
            settlement_date,
            owed_amount: allocation.calculated_share,
            actual_amount: allocation.adjusted_amount,
            equity_change,
            reason: reason.map(str::to_string),
        });
        self.partner_name.clone_from(&allocation.partner_name);
        self.ownership_percentage = allocation.ownership_percentage;
        self.total_owed_all_time += allocation.calculated_share;
        self.total_received_all_time += allocation.adjusted_amount;
        self.current_equity += equity_change;
        self.last_updated = settlement_date;
    }

    /// Whether `settlement_id` already appears in the history.
    #[must_use]
    pub fn has_settlement(&self, settlement_id: SettlementId) -> bool {
        self.settlement_history
            .iter()
            .any(|r| r.settlement_id == settlement_id)
    }

    /// Recompute equity from the history. Always equal to `current_equity`
    /// for a record that was only mutated through [`PartnerEquity::apply`].
    #[must_use]
    pub fn replayed_equity(&self) -> Decimal {
        self.settlement_history.iter().map(|r| r.equity_change).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(calculated: i64, adjusted: i64) -> PreSettlementAllocation {
        PreSettlementAllocation::new(
            &Partner::new("p1", "Asha", Decimal::new(50, 0)),
            Decimal::new(calculated, 0),
            Decimal::new(adjusted, 0),
            Decimal::ZERO,
        )
    }

    #[test]
    fn zeroed_record() {
        let partner = Partner::new("p1", "Asha", Decimal::new(50, 0));
        let rec = PartnerEquity::zeroed(&partner, Utc::now());
        assert_eq!(rec.current_equity, Decimal::ZERO);
        assert_eq!(rec.total_owed_all_time, Decimal::ZERO);
        assert!(rec.settlement_history.is_empty());
    }

    #[test]
    fn apply_accumulates_totals_and_equity() {
        let partner = Partner::new("p1", "Asha", Decimal::new(50, 0));
        let mut rec = PartnerEquity::zeroed(&partner, Utc::now());

        let first = SettlementId::new();
        rec.apply(&allocation(100, 80), first, Utc::now(), Some("short month"));
        assert_eq!(rec.current_equity, Decimal::new(-20, 0));
        assert_eq!(rec.total_owed_all_time, Decimal::new(100, 0));
        assert_eq!(rec.total_received_all_time, Decimal::new(80, 0));

        let second = SettlementId::new();
        rec.apply(&allocation(100, 115), second, Utc::now(), None);
        assert_eq!(rec.current_equity, Decimal::new(-5, 0));
        assert_eq!(rec.settlement_history.len(), 2);
        assert_eq!(rec.replayed_equity(), rec.current_equity);
        assert!(rec.has_settlement(first));
        assert!(rec.has_settlement(second));
        assert_eq!(rec.settlement_history[0].reason.as_deref(), Some("short month"));
    }
}
