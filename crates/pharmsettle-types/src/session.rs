//! # Settlement session: the editable proposal
//!
//! A session is one attempt to distribute a specific amount of cash.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐   commit    ┌───────────┐
//!   │ ACTIVE ├────────────▶│ PROCESSED │
//!   └───┬────┘             └───────────┘
//!       │ cancel
//!       ▼
//!   ┌───────────┐
//!   │ DISCARDED │
//!   └───────────┘
//! ```
//!
//! Both terminal states are final. Edits are only accepted while ACTIVE.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AllocationPlan, PartnerId, PreSettlementAllocation, Result, SessionId, SettleError,
    SettlementId, TransactionId, round_unit,
};

/// Lifecycle state of a settlement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SessionState {
    /// Proposal is open for edits.
    Active,
    /// Committed. Carries the identifiers of the committed settlement.
    #[serde(rename_all = "camelCase")]
    Processed {
        settlement_id: SettlementId,
        settlement_date: DateTime<Utc>,
        settlement_point_id: TransactionId,
    },
    /// Cancelled by the operator. Nothing was written.
    Discarded,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Processed { .. } => write!(f, "PROCESSED"),
            Self::Discarded => write!(f, "DISCARDED"),
        }
    }
}

/// An in-memory settlement proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSession {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub available_cash: Decimal,
    pub allocations: Vec<PreSettlementAllocation>,
    pub state: SessionState,
}

impl SettlementSession {
    /// Open an ACTIVE session from a recommendation.
    #[must_use]
    pub fn open(plan: AllocationPlan) -> Self {
        Self {
            session_id: SessionId::new(),
            created_at: Utc::now(),
            available_cash: plan.available_cash,
            allocations: plan.allocations,
            state: SessionState::Active,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    #[must_use]
    pub fn is_processed(&self) -> bool {
        matches!(self.state, SessionState::Processed { .. })
    }

    #[must_use]
    pub fn settlement_id(&self) -> Option<SettlementId> {
        match self.state {
            SessionState::Processed { settlement_id, .. } => Some(settlement_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn settlement_date(&self) -> Option<DateTime<Utc>> {
        match self.state {
            SessionState::Processed { settlement_date, .. } => Some(settlement_date),
            _ => None,
        }
    }

    #[must_use]
    pub fn settlement_point_id(&self) -> Option<TransactionId> {
        match self.state {
            SessionState::Processed {
                settlement_point_id,
                ..
            } => Some(settlement_point_id),
            _ => None,
        }
    }

    /// # Errors
    /// Returns [`SettleError::SessionNotActive`] once the session is terminal.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SettleError::SessionNotActive { state: self.state })
        }
    }

    /// What the allocations must sum to.
    #[must_use]
    pub fn target_total(&self) -> Decimal {
        round_unit(self.available_cash)
    }

    #[must_use]
    pub fn allocated_total(&self) -> Decimal {
        self.allocations.iter().map(|a| a.adjusted_amount).sum()
    }

    /// Cash still to be assigned; negative when over-allocated.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.target_total() - self.allocated_total()
    }

    #[must_use]
    pub fn allocation(&self, partner_id: &PartnerId) -> Option<&PreSettlementAllocation> {
        self.allocations.iter().find(|a| &a.partner_id == partner_id)
    }

    fn allocation_mut(&mut self, partner_id: &PartnerId) -> Result<&mut PreSettlementAllocation> {
        self.allocations
            .iter_mut()
            .find(|a| &a.partner_id == partner_id)
            .ok_or_else(|| SettleError::PartnerNotInSession(partner_id.clone()))
    }

    /// Override one partner's amount. The amount is rounded to whole units;
    /// other lines are left untouched, so the total may no longer balance.
    ///
    /// # Errors
    /// - `SessionNotActive` if the session is terminal
    /// - `PartnerNotInSession` if the partner has no line
    /// - `InvalidAmount` if the rounded amount is negative; the line keeps
    ///   its previous amount
    pub fn update_allocation(
        &mut self,
        partner_id: &PartnerId,
        new_amount: Decimal,
    ) -> Result<&PreSettlementAllocation> {
        self.ensure_active()?;
        let rounded = round_unit(new_amount);
        let allocation = self.allocation_mut(partner_id)?;
        if rounded < Decimal::ZERO {
            return Err(SettleError::InvalidAmount {
                reason: format!("{partner_id} cannot be paid {rounded}"),
            });
        }
        allocation.set_adjusted(rounded);
        Ok(&*allocation)
    }

    /// Put one partner back on the recommended amount.
    ///
    /// # Errors
    /// Same as [`SettlementSession::update_allocation`].
    pub fn reset_allocation(&mut self, partner_id: &PartnerId) -> Result<&PreSettlementAllocation> {
        self.ensure_active()?;
        let allocation = self.allocation_mut(partner_id)?;
        let recommended = allocation.recommended_amount;
        allocation.set_adjusted(recommended);
        Ok(&*allocation)
    }

    /// Transition ACTIVE → PROCESSED.
    ///
    /// # Errors
    /// Returns `SessionNotActive` if the session is already terminal.
    pub fn mark_processed(
        &mut self,
        settlement_id: SettlementId,
        settlement_date: DateTime<Utc>,
        settlement_point_id: TransactionId,
    ) -> Result<()> {
        self.ensure_active()?;
        self.state = SessionState::Processed {
            settlement_id,
            settlement_date,
            settlement_point_id,
        };
        Ok(())
    }

    /// Transition ACTIVE → DISCARDED.
    ///
    /// # Errors
    /// Returns `SessionNotActive` if the session is already terminal.
    pub fn mark_discarded(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.state = SessionState::Discarded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Partner;

    fn session() -> SettlementSession {
        let a = Partner::new("a", "Asha", Decimal::new(50, 0));
        let b = Partner::new("b", "Bilal", Decimal::new(50, 0));
        SettlementSession::open(AllocationPlan {
            available_cash: Decimal::new(1000, 0),
            target_total: Decimal::new(1000, 0),
            allocations: vec![
                PreSettlementAllocation::new(&a, Decimal::new(500, 0), Decimal::new(500, 0), Decimal::ZERO),
                PreSettlementAllocation::new(&b, Decimal::new(500, 0), Decimal::new(500, 0), Decimal::ZERO),
            ],
            unallocated: Decimal::ZERO,
        })
    }

    #[test]
    fn opens_active() {
        let s = session();
        assert!(s.is_active());
        assert!(!s.is_processed());
        assert_eq!(s.remaining(), Decimal::ZERO);
        assert!(s.settlement_date().is_none());
    }

    #[test]
    fn update_rounds_and_leaves_others_untouched() {
        let mut s = session();
        let a = PartnerId::new("a");
        let line = s.update_allocation(&a, Decimal::new(4506, 1)).unwrap();
        assert_eq!(line.adjusted_amount, Decimal::new(451, 0));
        assert_eq!(line.equity_adjustment, Decimal::new(-49, 0));
        assert_eq!(line.projected_equity, Decimal::new(-49, 0));
        assert_eq!(
            s.allocation(&PartnerId::new("b")).unwrap().adjusted_amount,
            Decimal::new(500, 0)
        );
        assert_eq!(s.remaining(), Decimal::new(49, 0));
    }

    #[test]
    fn reset_restores_recommendation() {
        let mut s = session();
        let a = PartnerId::new("a");
        s.update_allocation(&a, Decimal::new(10, 0)).unwrap();
        let line = s.reset_allocation(&a).unwrap();
        assert_eq!(line.adjusted_amount, Decimal::new(500, 0));
        assert!(!line.is_overridden());
    }

    #[test]
    fn negative_override_rejected() {
        let mut s = session();
        let a = PartnerId::new("a");
        let err = s.update_allocation(&a, Decimal::new(-10, 0)).unwrap_err();
        assert!(matches!(err, SettleError::InvalidAmount { .. }));
        assert!(err.is_validation());
        assert_eq!(s.allocation(&a).unwrap().adjusted_amount, Decimal::new(500, 0));

        // Rounds to zero, so it is accepted.
        let line = s.update_allocation(&a, Decimal::new(-4, 1)).unwrap();
        assert_eq!(line.adjusted_amount, Decimal::ZERO);
    }

    #[test]
    fn unknown_partner_rejected() {
        let mut s = session();
        let err = s
            .update_allocation(&PartnerId::new("zz"), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(err, SettleError::PartnerNotInSession(_)));
    }

    #[test]
    fn terminal_states_are_final() {
        let mut s = session();
        s.mark_discarded().unwrap();
        assert_eq!(s.state, SessionState::Discarded);
        assert!(s.mark_discarded().is_err());
        assert!(
            s.mark_processed(SettlementId::new(), Utc::now(), TransactionId::new())
                .is_err()
        );
        let err = s
            .update_allocation(&PartnerId::new("a"), Decimal::ONE)
            .unwrap_err();
        assert!(matches!(
            err,
            SettleError::SessionNotActive {
                state: SessionState::Discarded
            }
        ));
    }

    #[test]
    fn processed_exposes_settlement_details() {
        let mut s = session();
        let id = SettlementId::new();
        let point = TransactionId::new();
        let now = Utc::now();
        s.mark_processed(id, now, point).unwrap();
        assert!(s.is_processed());
        assert_eq!(s.settlement_id(), Some(id));
        assert_eq!(s.settlement_date(), Some(now));
        assert_eq!(s.settlement_point_id(), Some(point));
        assert_eq!(s.state.to_string(), "PROCESSED");
    }
}
