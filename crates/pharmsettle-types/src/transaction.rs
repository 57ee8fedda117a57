//! Transactions the engine asks the external transaction ledger to record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PartnerId, SettlementId};

/// Category of an emitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Cash paid to one partner.
    ProfitDistribution,
    /// Zero-value checkpoint marking when a settlement was confirmed.
    SettlementPoint,
}

impl std::fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfitDistribution => write!(f, "profit_distribution"),
            Self::SettlementPoint => write!(f, "settlement_point"),
        }
    }
}

/// A request to record one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub category: TransactionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakeholder_id: Option<PartnerId>,
    pub amount: Decimal,
    pub description: String,
    pub date: DateTime<Utc>,
    pub settlement_id: SettlementId,
}

impl TransactionRequest {
    /// A payment to one partner.
    #[must_use]
    pub fn distribution(
        settlement_id: SettlementId,
        stakeholder_id: PartnerId,
        amount: Decimal,
        description: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            category: TransactionCategory::ProfitDistribution,
            stakeholder_id: Some(stakeholder_id),
            amount,
            description,
            date,
            settlement_id,
        }
    }

    /// The zero-amount checkpoint closing a settlement.
    #[must_use]
    pub fn settlement_point(
        settlement_id: SettlementId,
        description: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            category: TransactionCategory::SettlementPoint,
            stakeholder_id: None,
            amount: Decimal::ZERO,
            description,
            date,
            settlement_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_names() {
        let json = serde_json::to_string(&TransactionCategory::ProfitDistribution).unwrap();
        assert_eq!(json, "\"profit_distribution\"");
        assert_eq!(TransactionCategory::SettlementPoint.to_string(), "settlement_point");
    }

    #[test]
    fn settlement_point_is_zero_value() {
        let tx = TransactionRequest::settlement_point(SettlementId::new(), "checkpoint".into(), Utc::now());
        assert_eq!(tx.amount, Decimal::ZERO);
        assert!(tx.stakeholder_id.is_none());
        let json = serde_json::to_string(&tx).unwrap();
        assert!(!json.contains("stakeholderId"));
    }
}
