//! Configuration for the allocation policy and the engine host.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SettleError, constants, pct};

/// Ratios governing how historical equity bends a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPolicy {
    /// Max boost for positive equity, as a share of the entitlement.
    pub boost_ratio: Decimal,
    /// A boosted amount never exceeds this share of available cash.
    pub boost_cap_ratio: Decimal,
    /// Max reduction for negative equity, as a share of the entitlement.
    pub reduction_ratio: Decimal,
    /// A reduced amount never drops below this share of the entitlement.
    pub reduction_floor_ratio: Decimal,
    /// Net payables under this amount count as zero.
    pub entitlement_tolerance: Decimal,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            boost_ratio: pct(constants::DEFAULT_BOOST_RATIO_PCT),
            boost_cap_ratio: pct(constants::DEFAULT_BOOST_CAP_PCT),
            reduction_ratio: pct(constants::DEFAULT_REDUCTION_RATIO_PCT),
            reduction_floor_ratio: pct(constants::DEFAULT_REDUCTION_FLOOR_PCT),
            entitlement_tolerance: Decimal::new(constants::DEFAULT_ENTITLEMENT_TOLERANCE_UNITS, 0),
        }
    }
}

impl AllocationPolicy {
    /// # Errors
    /// Returns `Configuration` if a ratio is outside `[0, 1]` or the
    /// tolerance is negative.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("boost_ratio", self.boost_ratio),
            ("boost_cap_ratio", self.boost_cap_ratio),
            ("reduction_ratio", self.reduction_ratio),
            ("reduction_floor_ratio", self.reduction_floor_ratio),
        ];
        for (name, value) in ratios {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(SettleError::Configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.entitlement_tolerance < Decimal::ZERO {
            return Err(SettleError::Configuration(format!(
                "entitlement_tolerance must be >= 0, got {}",
                self.entitlement_tolerance
            )));
        }
        Ok(())
    }
}

/// Host-level configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the equity ledger is persisted.
    pub ledger_path: PathBuf,
    pub policy: AllocationPolicy,
    /// Used for distribution transactions when the operator gives none.
    pub distribution_description: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from(constants::DEFAULT_LEDGER_PATH),
            policy: AllocationPolicy::default(),
            distribution_description: constants::DEFAULT_DISTRIBUTION_DESCRIPTION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns `Configuration` on malformed JSON or an invalid policy.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SettleError::Configuration(e.to_string()))?;
        config.policy.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    ///
    /// # Errors
    /// Returns `Configuration` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SettleError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}
