//! Durable per-partner equity ledger.
//!
//! The ledger is loaded in full when opened and persisted in full after
//! every mutation. Mutations are staged on a copy, written through the
//! [`EquityStore`], and only then swapped into memory:
//!
//! ```text
//! lock → clone → apply all → store.save(all) → swap → unlock
//! ```
//!
//! A failed save leaves both the store and the in-memory state untouched.
//! The mutex serializes commits from multiple hosts sharing one ledger.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use pharmsettle_types::{
    EngineConfig, Partner, PartnerEquity, PartnerId, PreSettlementAllocation, Result, SettleError,
    SettlementId, SettlementRecord,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{json_store::JsonFileStore, store::EquityStore};

struct LedgerState {
    records: BTreeMap<PartnerId, PartnerEquity>,
    store: Box<dyn EquityStore>,
}

/// Aggregate view over every partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub partners: usize,
    pub settlements: usize,
    pub total_owed_all_time: Decimal,
    pub total_received_all_time: Decimal,
    /// Σ current_equity; equals received − owed.
    pub net_equity: Decimal,
}

/// Per-partner record of all-time owed, all-time received, and running
/// equity, with settlement history.
pub struct EquityLedger {
    state: Mutex<LedgerState>,
}

impl EquityLedger {
    /// Load every record from `store`.
    ///
    /// # Errors
    /// Returns `Persistence` if the store cannot be read.
    pub fn open(mut store: impl EquityStore + 'static) -> Result<Self> {
        let loaded = store.load()?;
        let mut records = BTreeMap::new();
        for record in loaded {
            if let Some(previous) = records.insert(record.partner_id.clone(), record) {
                tracing::warn!(partner = %previous.partner_id, "Duplicate equity record on load; keeping the later one");
            }
        }
        tracing::info!(partners = records.len(), "Equity ledger opened");
        Ok(Self {
            state: Mutex::new(LedgerState {
                records,
                store: Box::new(store),
            }),
        })
    }

    /// Open the JSON ledger named by `config.ledger_path`.
    ///
    /// # Errors
    /// Returns `Persistence` if the file exists but cannot be read.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::open(JsonFileStore::new(&config.ledger_path))
    }

    // State is only ever replaced wholesale after a successful save, so a
    // poisoned lock still guards a consistent ledger.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn get(&self, partner_id: &PartnerId) -> Option<PartnerEquity> {
        self.lock().records.get(partner_id).cloned()
    }

    /// Signed equity for one partner; zero if the partner was never seen.
    #[must_use]
    pub fn current_equity(&self, partner_id: &PartnerId) -> Decimal {
        self.lock()
            .records
            .get(partner_id)
            .map_or(Decimal::ZERO, |r| r.current_equity)
    }

    /// `current_equity` for every known partner.
    #[must_use]
    pub fn equity_snapshot(&self) -> HashMap<PartnerId, Decimal> {
        self.lock()
            .records
            .iter()
            .map(|(id, r)| (id.clone(), r.current_equity))
            .collect()
    }

    /// All records, ordered by partner id.
    #[must_use]
    pub fn records(&self) -> Vec<PartnerEquity> {
        self.lock().records.values().cloned().collect()
    }

    /// Settlement history for one partner, oldest first.
    #[must_use]
    pub fn history(&self, partner_id: &PartnerId) -> Vec<SettlementRecord> {
        self.lock()
            .records
            .get(partner_id)
            .map(|r| r.settlement_history.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        let state = self.lock();
        let settlements: BTreeSet<SettlementId> = state
            .records
            .values()
            .flat_map(|r| r.settlement_history.iter().map(|h| h.settlement_id))
            .collect();
        LedgerSummary {
            partners: state.records.len(),
            settlements: settlements.len(),
            total_owed_all_time: state.records.values().map(|r| r.total_owed_all_time).sum(),
            total_received_all_time: state
                .records
                .values()
                .map(|r| r.total_received_all_time)
                .sum(),
            net_equity: state.records.values().map(|r| r.current_equity).sum(),
        }
    }

    /// Check every record against its own history:
    /// `current_equity == Σ equity_change == received − owed`.
    ///
    /// # Errors
    /// Returns [`SettleError::EquityInvariantViolation`] naming the first
    /// partner that fails.
    pub fn verify(&self) -> Result<()> {
        let state = self.lock();
        for record in state.records.values() {
            let replayed = record.replayed_equity();
            let net = record.total_received_all_time - record.total_owed_all_time;
            if record.current_equity != replayed || record.current_equity != net {
                return Err(SettleError::EquityInvariantViolation {
                    reason: format!(
                        "partner {}: current_equity {} but history sums to {replayed} \
                         and received - owed = {net}",
                        record.partner_id, record.current_equity
                    ),
                });
            }
        }
        Ok(())
    }

    // =================================================================
    // Mutations
    // =================================================================

    /// Create a zeroed record for every partner that lacks one.
    /// Returns how many were created; persists only when that is non-zero.
    ///
    /// # Errors
    /// Returns `Persistence` if the save fails; nothing is created then.
    pub fn ensure_records(&self, partners: &[Partner]) -> Result<usize> {
        let mut state = self.lock();
        let now = Utc::now();
        let missing: Vec<&Partner> = partners
            .iter()
            .filter(|p| !state.records.contains_key(&p.id))
            .collect();
        if missing.is_empty() {
            return Ok(0);
        }

        let mut staged = state.records.clone();
        for partner in &missing {
            staged
                .entry(partner.id.clone())
                .or_insert_with(|| PartnerEquity::zeroed(partner, now));
        }
        let created = staged.len() - state.records.len();
        Self::commit_staged(&mut state, staged)?;

        tracing::info!(created, "Equity records created");
        Ok(created)
    }

    /// Fold a committed settlement into the ledger. Every allocation gets a
    /// history entry, including zero-amount ones. All or nothing.
    ///
    /// # Errors
    /// - `SettlementAlreadyApplied` if `settlement_id` is already recorded
    /// - `Persistence` if the save fails; the ledger is unchanged then
    pub fn apply_settlement(
        &self,
        allocations: &[PreSettlementAllocation],
        settlement_id: SettlementId,
        settlement_date: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<()> {
        let mut state = self.lock();
        if state
            .records
            .values()
            .any(|r| r.has_settlement(settlement_id))
        {
            return Err(SettleError::SettlementAlreadyApplied(settlement_id));
        }

        let mut staged = state.records.clone();
        for allocation in allocations {
            let record = staged
                .entry(allocation.partner_id.clone())
                .or_insert_with(|| {
                    let partner = Partner {
                        id: allocation.partner_id.clone(),
                        name: allocation.partner_name.clone(),
                        ownership_percentage: allocation.ownership_percentage,
                    };
                    PartnerEquity::zeroed(&partner, settlement_date)
                });
            record.apply(allocation, settlement_id, settlement_date, reason);
        }
        Self::commit_staged(&mut state, staged)?;

        tracing::info!(
            settlement = %settlement_id,
            partners = allocations.len(),
            "Settlement applied to equity ledger"
        );
        Ok(())
    }

    fn commit_staged(
        state: &mut LedgerState,
        staged: BTreeMap<PartnerId, PartnerEquity>,
    ) -> Result<()> {
        let snapshot: Vec<PartnerEquity> = staged.values().cloned().collect();
        state.store.save(&snapshot)?;
        state.records = staged;
        Ok(())
    }
}

impl std::fmt::Debug for EquityLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquityLedger")
            .field("partners", &self.len())
            .finish_non_exhaustive()
    }
}
