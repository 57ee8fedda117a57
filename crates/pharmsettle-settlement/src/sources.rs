//! Collaborator seams: where payables and partners come from, and where
//! emitted transactions go.
//!
//! The in-memory implementations are complete enough for embedding and are
//! what the test suites drive the desk with.

use pharmsettle_types::{
    Partner, PartnerPayable, Result, SettleError, TransactionCategory, TransactionId,
    TransactionRequest,
};

/// Supplies per-partner earned/paid/net-owed figures as of "now".
pub trait PayableSource {
    fn business_partner_payables(&self) -> Result<Vec<PartnerPayable>>;
}

/// Supplies the partner list used to seed equity records.
pub trait PartnerDirectory {
    fn partners(&self) -> Result<Vec<Partner>>;
}

/// The external transaction ledger.
pub trait TransactionLedger {
    /// Record one transaction and return its id.
    fn record_transaction(&mut self, request: &TransactionRequest) -> Result<TransactionId>;

    /// Reverse a transaction recorded by this engine. Used to unwind a
    /// commit that failed part-way.
    fn void_transaction(&mut self, id: TransactionId) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Fixed payable snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticPayables(pub Vec<PartnerPayable>);

impl PayableSource for StaticPayables {
    fn business_partner_payables(&self) -> Result<Vec<PartnerPayable>> {
        Ok(self.0.clone())
    }
}

/// Fixed partner list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory(pub Vec<Partner>);

impl PartnerDirectory for StaticDirectory {
    fn partners(&self) -> Result<Vec<Partner>> {
        Ok(self.0.clone())
    }
}

/// A transaction as stored by [`InMemoryTransactionLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    pub id: TransactionId,
    pub request: TransactionRequest,
    pub voided: bool,
}

/// Append-only transaction log with voiding.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransactionLedger {
    entries: Vec<RecordedTransaction>,
}

impl InMemoryTransactionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transaction ever recorded, in recording order.
    #[must_use]
    pub fn all(&self) -> Vec<&RecordedTransaction> {
        self.entries.iter().collect()
    }

    /// Transactions that have not been voided.
    #[must_use]
    pub fn active(&self) -> Vec<&RecordedTransaction> {
        self.entries.iter().filter(|t| !t.voided).collect()
    }

    /// Active transactions of one category.
    #[must_use]
    pub fn by_category(&self, category: TransactionCategory) -> Vec<&RecordedTransaction> {
        self.entries
            .iter()
            .filter(|t| !t.voided && t.request.category == category)
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: &TransactionId) -> Option<&RecordedTransaction> {
        self.entries.iter().find(|t| &t.id == id)
    }
}

impl TransactionLedger for InMemoryTransactionLedger {
    fn record_transaction(&mut self, request: &TransactionRequest) -> Result<TransactionId> {
        let id = TransactionId::new();
        self.entries.push(RecordedTransaction {
            id,
            request: request.clone(),
            voided: false,
        });
        Ok(id)
    }

    fn void_transaction(&mut self, id: TransactionId) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| SettleError::TransactionRejected {
                reason: format!("cannot void unknown transaction {id}"),
            })?;
        if entry.voided {
            return Err(SettleError::TransactionRejected {
                reason: format!("transaction {id} already voided"),
            });
        }
        entry.voided = true;
        Ok(())
    }
}
