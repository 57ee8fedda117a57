//! Persistence seam for the equity ledger.
//!
//! The ledger always hands the store the **full** collection, so a store
//! only needs to replace its contents atomically.

use pharmsettle_types::{PartnerEquity, Result};

/// Durable backing for [`crate::EquityLedger`].
pub trait EquityStore: Send {
    /// Load every persisted record.
    fn load(&mut self) -> Result<Vec<PartnerEquity>>;

    /// Replace the persisted collection with `records`. Must be all or
    /// nothing: on error the previously persisted collection is intact.
    fn save(&mut self, records: &[PartnerEquity]) -> Result<()>;
}

/// Volatile store for tests and embedding. Counts saves.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<PartnerEquity>,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection, as if loaded from disk.
    #[must_use]
    pub fn with_records(records: Vec<PartnerEquity>) -> Self {
        Self { records, saves: 0 }
    }

    /// Number of successful `save` calls.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl EquityStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<PartnerEquity>> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[PartnerEquity]) -> Result<()> {
        self.records = records.to_vec();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pharmsettle_types::Partner;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn save_then_load() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let rec = PartnerEquity::zeroed(&Partner::new("a", "Asha", Decimal::new(50, 0)), Utc::now());
        store.save(std::slice::from_ref(&rec)).unwrap();
        assert_eq!(store.load().unwrap(), vec![rec]);
        assert_eq!(store.save_count(), 1);
    }
}
