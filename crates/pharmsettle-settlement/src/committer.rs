//! Settlement committer: turns a validated session into durable records.
//!
//! Order of effects:
//! 1. Validate (no side effects on failure)
//! 2. One `profit_distribution` transaction per allocation with amount > 0
//! 3. One zero-amount `settlement_point` checkpoint transaction
//! 4. Apply every allocation (including zeros) to the equity ledger
//! 5. Mark the session PROCESSED
//!
//! The ledger update runs last. If step 2, 3, or 4 fails, the transactions
//! already recorded for this settlement are voided in reverse order and the
//! original error is returned; the session stays ACTIVE.

use chrono::{DateTime, Utc};
use pharmsettle_ledger::EquityLedger;
use pharmsettle_types::{
    PreSettlementAllocation, Result, SettleError, SettlementId, SettlementSession, TransactionId,
    TransactionRequest, constants,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{sources::TransactionLedger, validator};

/// Proof of a committed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub settlement_id: SettlementId,
    pub settlement_date: DateTime<Utc>,
    pub settlement_point_id: TransactionId,
    /// One per allocation with a positive amount, in allocation order.
    pub distribution_ids: Vec<TransactionId>,
    pub total_distributed: Decimal,
    /// Hex SHA-256 over the settlement id and every allocation line.
    pub digest: String,
}

/// Deterministic digest of a settlement decision.
///
/// Format: `"pharmsettle:settlement:v1:" || settlement_id || count || (partner_id || share || amount)*`
#[must_use]
pub fn settlement_digest(
    settlement_id: SettlementId,
    allocations: &[PreSettlementAllocation],
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::SETTLEMENT_DIGEST_DOMAIN);
    hasher.update(settlement_id.0.as_bytes());
    hasher.update((allocations.len() as u64).to_le_bytes());
    for a in allocations {
        hasher.update(a.partner_id.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(a.calculated_share.normalize().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(a.adjusted_amount.normalize().to_string().as_bytes());
        hasher.update([0u8]);
    }
    hasher.finalize().into()
}

/// Executes the commit sequence against the collaborators.
#[derive(Debug, Clone)]
pub struct SettlementCommitter {
    distribution_description: String,
}

impl Default for SettlementCommitter {
    fn default() -> Self {
        Self::new(constants::DEFAULT_DISTRIBUTION_DESCRIPTION)
    }
}

impl SettlementCommitter {
    #[must_use]
    pub fn new(distribution_description: impl Into<String>) -> Self {
        Self {
            distribution_description: distribution_description.into(),
        }
    }

    /// Commit `session`.
    ///
    /// # Errors
    /// - `Validation` with every violated precondition; nothing is written
    /// - any error from the transaction ledger or equity ledger; recorded
    ///   transactions are voided and the equity ledger is unchanged
    pub fn commit<T>(
        &self,
        session: &mut SettlementSession,
        transactions: &mut T,
        ledger: &EquityLedger,
        description: Option<&str>,
    ) -> Result<SettlementReceipt>
    where
        T: TransactionLedger + ?Sized,
    {
        let validation = validator::validate(session);
        if !validation.can_process {
            return Err(SettleError::Validation {
                issues: validation.issues,
            });
        }

        let settlement_id = SettlementId::new();
        let settlement_date = Utc::now();
        let base = description.unwrap_or(&self.distribution_description);

        let mut recorded: Vec<TransactionId> = Vec::new();
        let outcome = emit_and_apply(
            session,
            transactions,
            ledger,
            &mut recorded,
            settlement_id,
            settlement_date,
            base,
            description,
        );

        let settlement_point_id = match outcome {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(
                    settlement = %settlement_id,
                    recorded = recorded.len(),
                    error = %err,
                    "Settlement commit failed; voiding recorded transactions"
                );
                rollback(transactions, &recorded);
                return Err(err);
            }
        };

        session.mark_processed(settlement_id, settlement_date, settlement_point_id)?;

        // The checkpoint is the last recorded transaction.
        recorded.pop();
        let total_distributed = session.allocated_total();
        let digest = hex::encode(settlement_digest(settlement_id, &session.allocations));

        tracing::info!(
            settlement = %settlement_id,
            session = %session.session_id,
            distributions = recorded.len(),
            total = %total_distributed,
            digest = %digest,
            "Settlement committed"
        );

        Ok(SettlementReceipt {
            settlement_id,
            settlement_date,
            settlement_point_id,
            distribution_ids: recorded,
            total_distributed,
            digest,
        })
    }
}

/// Steps 2–4. Every recorded transaction id is pushed to `recorded`
/// before anything that can fail runs next. Returns the checkpoint id.
#[allow(clippy::too_many_arguments)]
fn emit_and_apply<T>(
    session: &SettlementSession,
    transactions: &mut T,
    ledger: &EquityLedger,
    recorded: &mut Vec<TransactionId>,
    settlement_id: SettlementId,
    settlement_date: DateTime<Utc>,
    base: &str,
    reason: Option<&str>,
) -> Result<TransactionId>
where
    T: TransactionLedger + ?Sized,
{
    for allocation in session
        .allocations
        .iter()
        .filter(|a| a.adjusted_amount > Decimal::ZERO)
    {
        let request = TransactionRequest::distribution(
            settlement_id,
            allocation.partner_id.clone(),
            allocation.adjusted_amount,
            format!("{base} - {}", allocation.partner_name),
            settlement_date,
        );
        let id = transactions.record_transaction(&request)?;
        tracing::debug!(
            partner = %allocation.partner_id,
            amount = %allocation.adjusted_amount,
            tx = %id,
            "Distribution recorded"
        );
        recorded.push(id);
    }

    let checkpoint = TransactionRequest::settlement_point(
        settlement_id,
        format!(
            "Settlement point - {} partners, {} distributed",
            session.allocations.len(),
            session.allocated_total()
        ),
        settlement_date,
    );
    let point_id = transactions.record_transaction(&checkpoint)?;
    recorded.push(point_id);

    ledger.apply_settlement(&session.allocations, settlement_id, settlement_date, reason)?;
    Ok(point_id)
}

fn rollback<T>(transactions: &mut T, recorded: &[TransactionId])
where
    T: TransactionLedger + ?Sized,
{
    for id in recorded.iter().rev() {
        if let Err(err) = transactions.void_transaction(*id) {
            tracing::error!(tx = %id, error = %err, "Failed to void transaction during rollback");
        }
    }
}
