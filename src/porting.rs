//! Porting matcher: picks the custodians that back a new mint request.
//!
//! Pure planner. It never mutates the pool; the engine applies a returned plan
//! atomically, so a request that cannot be covered in full leaves the snapshot
//! untouched.
//!
//! Selection rules:
//! - candidates are custodians with a registered remote address for the asset,
//!   ordered ascending by free collateral (ties break on address, which the
//!   pool's ordering already provides);
//! - if any single custodian can cover the whole 150%-scaled cost, the
//!   smallest such custodian is chosen (tightest fit, least fragmentation);
//! - otherwise custodians are consumed greedily from the largest down, each
//!   contributing as much as its free collateral supports at 150%.

use crate::collateral::{scale_down, scale_up};
use crate::custodian::{Custodian, CustodianPool};
use crate::rates::Converter;
use crate::requests::{MatchError, MatchedPortingCustodian};
use crate::types::AssetId;

fn candidates<'a>(pool: &'a CustodianPool, asset: AssetId) -> Vec<&'a Custodian> {
    let mut list: Vec<&Custodian> = pool
        .iter()
        .filter(|(_, c)| c.remote_address(asset).is_some())
        .map(|(_, c)| c)
        .collect();
    // stable sort keeps the pool's address order on equal free collateral
    list.sort_by_key(|c| c.free_collateral);
    list
}

fn entry(custodian: &Custodian, asset: AssetId, amount: u64, cost: u64) -> MatchedPortingCustodian {
    MatchedPortingCustodian {
        inc_address: custodian.inc_address.clone(),
        // candidates are pre-filtered on this address existing
        remote_address: custodian
            .remote_address(asset)
            .cloned()
            .unwrap_or_default(),
        amount,
        locked_collateral: cost,
        remain_collateral: custodian.free_collateral - cost,
    }
}

/// Plans a match covering `amount` of `asset`, or fails without side effects.
pub fn plan_porting_match(
    pool: &CustodianPool,
    converter: &Converter<'_>,
    asset: AssetId,
    amount: u64,
) -> Result<Vec<MatchedPortingCustodian>, MatchError> {
    let sorted = candidates(pool, asset);
    if sorted.is_empty() {
        return Err(MatchError::InsufficientCustodianLiquidity);
    }

    // 150%-over-collateralized cost of the full request, in collateral units
    let required = converter.asset_to_collateral(asset, scale_up(amount))?;

    let largest = sorted[sorted.len() - 1];
    if largest.free_collateral >= required {
        // single-custodian path: smallest custodian that still covers the
        // whole request
        let picked = sorted
            .iter()
            .find(|c| c.free_collateral >= required)
            .unwrap_or(&largest);
        return Ok(vec![entry(picked, asset, amount, required)]);
    }

    // multi-custodian path: largest free collateral first
    let mut matched = Vec::new();
    let mut remaining = amount;
    for custodian in sorted.iter().rev() {
        if remaining == 0 {
            break;
        }

        // how much of the asset this custodian's free collateral can back at 150%
        let supportable =
            scale_down(converter.collateral_to_asset(asset, custodian.free_collateral)?);
        let take = supportable.min(remaining);
        if take == 0 {
            continue;
        }

        let cost = converter.asset_to_collateral(asset, scale_up(take))?;
        if cost == 0 || custodian.free_collateral < cost {
            continue;
        }

        matched.push(entry(custodian, asset, take, cost));
        remaining -= take;
    }

    if remaining > 0 {
        // no partial porting: the pool as a whole cannot back the request
        return Err(MatchError::InsufficientCustodianLiquidity);
    }
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateTable;
    use crate::types::IncAddress;
    use std::collections::{BTreeMap, BTreeSet};

    const COLLATERAL: AssetId = AssetId(0);
    const BTC: AssetId = AssetId(1);

    fn pool_with(frees: &[(&str, u64)]) -> CustodianPool {
        let mut pool = CustodianPool::new();
        for (addr, free) in frees {
            let mut c = Custodian::new(
                IncAddress::from(*addr),
                [(BTC, format!("remote-{addr}"))].into_iter().collect(),
            );
            c.deposit(*free);
            pool.insert(c);
        }
        pool
    }

    // identity rates: 1 asset unit == 1 collateral unit
    fn rates() -> (RateTable, BTreeSet<AssetId>) {
        let mut t = RateTable::default();
        t.set_price(COLLATERAL, 1_000);
        t.set_price(BTC, 1_000);
        (t, [BTC].into_iter().collect())
    }

    #[test]
    fn tightest_fit_single_custodian() {
        let pool = pool_with(&[("a", 100), ("b", 200), ("c", 300)]);
        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        // 100 requested -> 150 collateral required; picks the 200, not the 300
        let plan = plan_porting_match(&pool, &conv, BTC, 100).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].inc_address, "b");
        assert_eq!(plan[0].amount, 100);
        assert_eq!(plan[0].locked_collateral, 150);
        assert_eq!(plan[0].remain_collateral, 50);
    }

    #[test]
    fn exact_fit_is_still_single() {
        let pool = pool_with(&[("a", 100), ("b", 150)]);
        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        let plan = plan_porting_match(&pool, &conv, BTC, 100).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].inc_address, "b");
        assert_eq!(plan[0].remain_collateral, 0);
    }

    #[test]
    fn multi_custodian_covers_in_descending_order() {
        let pool = pool_with(&[("a", 150), ("b", 300)]);
        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        // 250 requested -> 375 collateral required, no single custodian has it.
        // b (300 free) backs 200, a (150 free) backs the remaining 50.
        let plan = plan_porting_match(&pool, &conv, BTC, 250).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].inc_address, "b");
        assert_eq!(plan[0].amount, 200);
        assert_eq!(plan[0].locked_collateral, 300);
        assert_eq!(plan[1].inc_address, "a");
        assert_eq!(plan[1].amount, 50);
        assert_eq!(plan[1].locked_collateral, 75);
        assert_eq!(plan.iter().map(|m| m.amount).sum::<u64>(), 250);
    }

    #[test]
    fn exhausted_pool_fails_whole_request() {
        let pool = pool_with(&[("a", 150), ("b", 300)]);
        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        assert_eq!(
            plan_porting_match(&pool, &conv, BTC, 400).unwrap_err(),
            MatchError::InsufficientCustodianLiquidity
        );
    }

    #[test]
    fn custodian_without_remote_address_is_ignored() {
        let mut pool = pool_with(&[("a", 100)]);
        let mut rich = Custodian::new("rich".into(), BTreeMap::new());
        rich.deposit(1_000_000);
        pool.insert(rich);

        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);
        assert_eq!(
            plan_porting_match(&pool, &conv, BTC, 500).unwrap_err(),
            MatchError::InsufficientCustodianLiquidity
        );
    }

    #[test]
    fn planning_never_mutates_the_pool() {
        let pool = pool_with(&[("a", 150), ("b", 300)]);
        let before = pool.clone();
        let (t, sup) = rates();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        let _ = plan_porting_match(&pool, &conv, BTC, 250);
        let _ = plan_porting_match(&pool, &conv, BTC, 10_000);
        assert_eq!(pool, before);
    }
}
