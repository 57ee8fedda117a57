//! System-wide constants for the PharmSettle settlement engine.

/// Share of the entitlement a positive equity balance may add (30%).
pub const DEFAULT_BOOST_RATIO_PCT: u32 = 30;

/// Ceiling on any boosted allocation, as a share of available cash (60%).
pub const DEFAULT_BOOST_CAP_PCT: u32 = 60;

/// Share of the entitlement a negative equity balance may remove (30%).
pub const DEFAULT_REDUCTION_RATIO_PCT: u32 = 30;

/// Floor on any reduced allocation, as a share of the entitlement (70%).
pub const DEFAULT_REDUCTION_FLOOR_PCT: u32 = 70;

/// Net payables below this many currency units are treated as nothing owed.
pub const DEFAULT_ENTITLEMENT_TOLERANCE_UNITS: i64 = 1;

/// Version tag written into persisted equity ledgers.
pub const LEDGER_FORMAT_VERSION: u32 = 1;

/// Default location of the persisted equity ledger.
pub const DEFAULT_LEDGER_PATH: &str = "data/partner_equity.json";

/// Default description attached to distribution transactions.
pub const DEFAULT_DISTRIBUTION_DESCRIPTION: &str = "Profit distribution";

/// Domain separator for settlement digests.
pub const SETTLEMENT_DIGEST_DOMAIN: &[u8] = b"pharmsettle:settlement:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "PharmSettle";
