// 5.0: the whole-portal snapshot one block works on. loaded from the store at
// block start, owned exclusively by the processing routine, persisted at
// commit. clonable so an instruction can run against a scratch copy and be
// discarded on failure.

use crate::custodian::CustodianPool;
use crate::liquidation::LiquidationPool;
use crate::rates::RateTable;
use crate::requests::{WaitingPorting, WaitingRedeem};
use crate::types::{IncAddress, PortingId, RedeemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-epoch aggregate of collateral locked by porting matches. Only consumed
/// by the external reward computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCollateral {
    pub total: u64,
    pub per_custodian: BTreeMap<IncAddress, u64>,
}

impl LockedCollateral {
    pub fn add(&mut self, address: &str, amount: u64) {
        self.total += amount;
        *self.per_custodian.entry(address.to_string()).or_insert(0) += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalState {
    pub custodians: CustodianPool,
    pub waiting_portings: BTreeMap<PortingId, WaitingPorting>,
    pub waiting_redeems: BTreeMap<RedeemId, WaitingRedeem>,
    /// Final exchange rates for the block; absent until the first rate update.
    pub rates: Option<RateTable>,
    pub liquidation_pool: LiquidationPool,
    pub locked_collateral: LockedCollateral,
}

impl PortalState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_collateral_aggregates_per_custodian() {
        let mut lc = LockedCollateral::default();
        lc.add("a", 100);
        lc.add("b", 50);
        lc.add("a", 25);
        assert_eq!(lc.total, 175);
        assert_eq!(lc.per_custodian["a"], 125);
        assert_eq!(lc.per_custodian["b"], 50);
    }
}
