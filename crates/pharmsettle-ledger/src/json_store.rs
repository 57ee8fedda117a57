//! JSON file store for the equity ledger.
//!
//! The whole collection lives in one versioned document:
//!
//! ```json
//! { "version": 1, "records": [ { "partnerId": "…", … } ] }
//! ```
//!
//! Records are sorted by partner id so identical ledgers serialize
//! identically. Writes go to `<file>.tmp`, are fsynced, then renamed over the
//! target, so a crash mid-write leaves the previous ledger in place.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use pharmsettle_types::{PartnerEquity, Result, SettleError, constants};
use serde::{Deserialize, Serialize};

use crate::store::EquityStore;

#[derive(Serialize, Deserialize)]
struct PersistedLedger {
    version: u32,
    records: Vec<PartnerEquity>,
}

/// File-backed [`EquityStore`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EquityStore for JsonFileStore {
    fn load(&mut self) -> Result<Vec<PartnerEquity>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No equity ledger on disk; starting empty");
            return Ok(Vec::new());
        }
        let bytes = std::fs::read(&self.path)?;
        let persisted: PersistedLedger = serde_json::from_slice(&bytes).map_err(|e| {
            SettleError::Persistence(format!("corrupt ledger {}: {e}", self.path.display()))
        })?;
        if persisted.version != constants::LEDGER_FORMAT_VERSION {
            return Err(SettleError::Persistence(format!(
                "unsupported ledger version {} in {} (expected {})",
                persisted.version,
                self.path.display(),
                constants::LEDGER_FORMAT_VERSION
            )));
        }
        Ok(persisted.records)
    }

    fn save(&mut self, records: &[PartnerEquity]) -> Result<()> {
        let mut records = records.to_vec();
        records.sort_by(|a, b| a.partner_id.cmp(&b.partner_id));
        let doc = PersistedLedger {
            version: constants::LEDGER_FORMAT_VERSION,
            records,
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| SettleError::Persistence(format!("cannot encode ledger: {e}")))?;
        atomic_write(&self.path, &bytes)?;
        tracing::debug!(
            path = %self.path.display(),
            records = doc.records.len(),
            bytes = bytes.len(),
            "Equity ledger saved"
        );
        Ok(())
    }
}

/// Write to a temp sibling, fsync, rename over `path`.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("tmp");
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    // Best effort: persist the rename itself on POSIX systems.
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Ok(d) = std::fs::File::open(dir) {
            let _ = d.sync_all();
        }
    }
    Ok(())
}
