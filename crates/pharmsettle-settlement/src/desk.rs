//! The settlement desk: one operator, at most one live session.
//!
//! ```text
//! (none) ──initialize──▶ ACTIVE ──commit──▶ PROCESSED
//!                          │
//!                          └──cancel───▶ DISCARDED
//! ```
//!
//! A terminal session stays on the desk for inspection until the next
//! `initialize` replaces it.

use std::sync::Arc;

use pharmsettle_allocator::{AllocationInputs, AllocationRecommender};
use pharmsettle_ledger::EquityLedger;
use pharmsettle_types::{
    EngineConfig, PartnerId, PreSettlementAllocation, Result, SettleError, SettlementSession,
    SettlementValidation,
};
use rust_decimal::Decimal;

use crate::{
    committer::{SettlementCommitter, SettlementReceipt},
    sources::{PartnerDirectory, PayableSource, TransactionLedger},
    validator,
};

/// Drives the settlement session lifecycle against its collaborators.
pub struct SettlementDesk<P, D, T> {
    payables: P,
    directory: D,
    transactions: T,
    ledger: Arc<EquityLedger>,
    recommender: AllocationRecommender,
    committer: SettlementCommitter,
    session: Option<SettlementSession>,
}

impl<P, D, T> SettlementDesk<P, D, T>
where
    P: PayableSource,
    D: PartnerDirectory,
    T: TransactionLedger,
{
    /// Desk with the default allocation policy.
    #[must_use]
    pub fn new(payables: P, directory: D, transactions: T, ledger: Arc<EquityLedger>) -> Self {
        Self {
            payables,
            directory,
            transactions,
            ledger,
            recommender: AllocationRecommender::default(),
            committer: SettlementCommitter::default(),
            session: None,
        }
    }

    /// Desk using the policy and distribution description from `config`.
    ///
    /// # Errors
    /// Returns `Configuration` if the policy is invalid.
    pub fn with_config(
        payables: P,
        directory: D,
        transactions: T,
        ledger: Arc<EquityLedger>,
        config: &EngineConfig,
    ) -> Result<Self> {
        Ok(Self {
            recommender: AllocationRecommender::new(config.policy.clone())?,
            committer: SettlementCommitter::new(config.distribution_description.clone()),
            ..Self::new(payables, directory, transactions, ledger)
        })
    }

    /// Open a new session for `available_cash`.
    ///
    /// Seeds equity records for every directory partner, then asks the
    /// recommender for a reconciled proposal.
    ///
    /// # Errors
    /// - `ConcurrentSettlement` if a session is already ACTIVE
    /// - `InvalidCash` if `available_cash` is negative
    /// - `NoEligiblePartners` if nobody holds ownership; no session is opened
    /// - any collaborator or persistence error
    pub fn initialize(&mut self, available_cash: Decimal) -> Result<&SettlementSession> {
        if self.session.as_ref().is_some_and(SettlementSession::is_active) {
            return Err(SettleError::ConcurrentSettlement);
        }
        if available_cash < Decimal::ZERO {
            return Err(SettleError::InvalidCash(available_cash));
        }

        let partners = self.directory.partners()?;
        let created = self.ledger.ensure_records(&partners)?;
        let payables = self.payables.business_partner_payables()?;
        let equity = self.ledger.equity_snapshot();

        let plan = self.recommender.recommend(&AllocationInputs {
            available_cash,
            partners: &partners,
            payables: &payables,
            equity: &equity,
        })?;
        if plan.is_empty() {
            return Err(SettleError::NoEligiblePartners {
                unallocated: plan.unallocated,
            });
        }

        let session = SettlementSession::open(plan);
        tracing::info!(
            session = %session.session_id,
            cash = %available_cash,
            partners = session.allocations.len(),
            new_records = created,
            "Settlement session initialized"
        );
        Ok(self.session.insert(session))
    }

    /// The current session, live or terminal.
    #[must_use]
    pub fn session(&self) -> Option<&SettlementSession> {
        self.session.as_ref()
    }

    /// Override one partner's amount (rounded to whole units).
    ///
    /// # Errors
    /// `NoSession`, `SessionNotActive`, `PartnerNotInSession`, or
    /// `InvalidAmount` if the rounded amount is negative.
    pub fn update_allocation(
        &mut self,
        partner_id: &PartnerId,
        new_amount: Decimal,
    ) -> Result<&PreSettlementAllocation> {
        let session = self.session.as_mut().ok_or(SettleError::NoSession)?;
        let allocation = session.update_allocation(partner_id, new_amount)?;
        tracing::debug!(
            partner = %partner_id,
            amount = %allocation.adjusted_amount,
            recommended = %allocation.recommended_amount,
            "Allocation overridden"
        );
        Ok(allocation)
    }

    /// Restore one partner's recommended amount.
    ///
    /// # Errors
    /// `NoSession`, `SessionNotActive`, or `PartnerNotInSession`.
    pub fn reset_allocation(&mut self, partner_id: &PartnerId) -> Result<&PreSettlementAllocation> {
        let session = self.session.as_mut().ok_or(SettleError::NoSession)?;
        session.reset_allocation(partner_id)
    }

    /// # Errors
    /// Returns `NoSession` if nothing has been initialized.
    pub fn validate(&self) -> Result<SettlementValidation> {
        self.session
            .as_ref()
            .map(validator::validate)
            .ok_or(SettleError::NoSession)
    }

    /// Discard the active session. The equity ledger is not touched.
    ///
    /// # Errors
    /// `NoSession` or `SessionNotActive`.
    pub fn cancel(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(SettleError::NoSession)?;
        session.mark_discarded()?;
        tracing::info!(session = %session.session_id, "Settlement session cancelled");
        Ok(())
    }

    /// Commit the active session.
    ///
    /// # Errors
    /// `NoSession`, plus everything [`SettlementCommitter::commit`] returns.
    /// On error the session stays ACTIVE.
    pub fn commit(&mut self, description: Option<&str>) -> Result<SettlementReceipt> {
        let session = self.session.as_mut().ok_or(SettleError::NoSession)?;
        self.committer
            .commit(session, &mut self.transactions, &self.ledger, description)
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<EquityLedger> {
        &self.ledger
    }

    #[must_use]
    pub fn transactions(&self) -> &T {
        &self.transactions
    }

    pub fn transactions_mut(&mut self) -> &mut T {
        &mut self.transactions
    }

    /// Swap or refresh the payable source between sessions.
    pub fn payables_mut(&mut self) -> &mut P {
        &mut self.payables
    }
}

impl<P, D, T> std::fmt::Debug for SettlementDesk<P, D, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementDesk")
            .field("ledger", &self.ledger)
            .field("session", &self.session.as_ref().map(|s| (s.session_id, s.state)))
            .finish_non_exhaustive()
    }
}
