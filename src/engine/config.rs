//! Engine configuration and protocol parameters.

use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Protocol constants shared by all validators. Changing any of these is a
/// consensus break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalParams {
    /// Native collateral asset; must always carry a rate table entry.
    pub collateral_asset: AssetId,
    /// Foreign assets the portal accepts.
    pub supported_assets: BTreeSet<AssetId>,
    /// Full-liquidation tier bound (inclusive).
    pub tp120: u64,
    /// Partial-warning tier bound (inclusive).
    pub tp130: u64,
    /// Percent of a failed redeem's value paid to the redeemer from the
    /// custodian's collateral.
    pub compensation_percent: u64,
    pub porting_fee_bps: u64,
    pub redeem_fee_bps: u64,
    /// Heights a matched porting request stays open before expiring.
    pub porting_expiry_window: u64,
}

impl Default for PortalParams {
    fn default() -> Self {
        Self {
            collateral_asset: AssetId(0),
            supported_assets: [AssetId(1), AssetId(2)].into_iter().collect(),
            tp120: 120,
            tp130: 130,
            compensation_percent: 105,
            porting_fee_bps: 1,
            redeem_fee_bps: 1,
            porting_expiry_window: 1_500,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub params: PortalParams,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: PortalParams::default(),
            max_events: 100_000,
            verbose: false,
        }
    }
}
