//! Redeem matcher: picks the custodians that return a burned asset.
//!
//! Pure planner over attested holdings, mirroring the porting matcher's shape:
//! tightest single fit when one custodian holds enough, otherwise greedy
//! consumption from the largest holder down. Collateral is not touched here;
//! it unlocks later when the custodian actually delivers.

use crate::custodian::{Custodian, CustodianPool};
use crate::requests::{MatchError, MatchedRedeemCustodian};
use crate::types::AssetId;

fn holders<'a>(pool: &'a CustodianPool, asset: AssetId) -> Vec<&'a Custodian> {
    let mut list: Vec<&Custodian> = pool
        .iter()
        .filter(|(_, c)| c.holding(asset) > 0)
        .map(|(_, c)| c)
        .collect();
    list.sort_by_key(|c| c.holding(asset));
    list
}

fn entry(custodian: &Custodian, asset: AssetId, amount: u64) -> MatchedRedeemCustodian {
    MatchedRedeemCustodian {
        inc_address: custodian.inc_address.clone(),
        remote_address: custodian
            .remote_address(asset)
            .cloned()
            .unwrap_or_default(),
        amount,
    }
}

/// Plans custodians covering a redeem of `amount` of `asset`, or fails with
/// no side effects when total holdings fall short.
pub fn plan_redeem_match(
    pool: &CustodianPool,
    asset: AssetId,
    amount: u64,
) -> Result<Vec<MatchedRedeemCustodian>, MatchError> {
    let sorted = holders(pool, asset);
    if sorted.is_empty() {
        return Err(MatchError::InsufficientCustodianLiquidity);
    }

    let largest = sorted[sorted.len() - 1];
    if largest.holding(asset) >= amount {
        // smallest holder that still covers the full amount
        let picked = sorted
            .iter()
            .find(|c| c.holding(asset) >= amount)
            .unwrap_or(&largest);
        return Ok(vec![entry(picked, asset, amount)]);
    }

    let mut matched = Vec::new();
    let mut remaining = amount;
    for custodian in sorted.iter().rev() {
        let take = custodian.holding(asset).min(remaining);
        matched.push(entry(custodian, asset, take));
        remaining -= take;
        if remaining == 0 {
            return Ok(matched);
        }
    }

    Err(MatchError::InsufficientCustodianLiquidity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IncAddress;

    const BTC: AssetId = AssetId(1);

    fn pool_holding(holdings: &[(&str, u64)]) -> CustodianPool {
        let mut pool = CustodianPool::new();
        for (addr, held) in holdings {
            let mut c = Custodian::new(
                IncAddress::from(*addr),
                [(BTC, format!("remote-{addr}"))].into_iter().collect(),
            );
            c.credit_holding(BTC, *held);
            pool.insert(c);
        }
        pool
    }

    #[test]
    fn multi_holder_greedy_from_largest() {
        let pool = pool_holding(&[("a", 10), ("b", 30), ("c", 60)]);

        // redeem 70: takes 60 from c then 10 from the next-largest b; a untouched
        let plan = plan_redeem_match(&pool, BTC, 70).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].inc_address, "c");
        assert_eq!(plan[0].amount, 60);
        assert_eq!(plan[1].inc_address, "b");
        assert_eq!(plan[1].amount, 10);
        assert_eq!(plan.iter().map(|m| m.amount).sum::<u64>(), 70);
        assert!(plan.iter().all(|m| m.inc_address != "a"));
    }

    #[test]
    fn tightest_fit_single_holder() {
        let pool = pool_holding(&[("a", 10), ("b", 30), ("c", 60)]);

        // 25 fits in b (30) even though c (60) also covers it
        let plan = plan_redeem_match(&pool, BTC, 25).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].inc_address, "b");
        assert_eq!(plan[0].amount, 25);
    }

    #[test]
    fn insufficient_holdings_fail() {
        let pool = pool_holding(&[("a", 10), ("b", 30)]);
        assert_eq!(
            plan_redeem_match(&pool, BTC, 41).unwrap_err(),
            MatchError::InsufficientCustodianLiquidity
        );
    }

    #[test]
    fn zero_holders_fail() {
        let pool = pool_holding(&[]);
        assert_eq!(
            plan_redeem_match(&pool, BTC, 1).unwrap_err(),
            MatchError::InsufficientCustodianLiquidity
        );
    }
}
