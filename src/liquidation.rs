//! Liquidation detection against fixed collateralization tiers.
//!
//! Per custodian, per held asset, the ratio
//! `tp = floor(locked_collateral * 100 / value_of_holdings_in_collateral)`
//! classifies into two tiers: at or below 120 the custodian's locked
//! collateral and holdings for the asset are seized in full; between 121 and
//! 130 the breach is recorded with zero amounts (observed upstream behavior,
//! kept exactly — see DESIGN.md); above 130 nothing happens.
//!
//! Seized amounts accumulate into a per-epoch pool that a separate claims
//! process consumes.

use crate::collateral::{mul_div, proportional_share, scale_up, MathError};
use crate::custodian::Custodian;
use crate::rates::{Converter, RateError};
use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LiquidationError {
    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("holdings convert to zero collateral; ratio divides by zero")]
    DivisionByZero,

    #[error("liquidation pool has no entry for {0}")]
    PoolEntryMissing(AssetId),

    #[error("liquidation pool balance for {0} is below the claimed amount")]
    InsufficientPoolBalance(AssetId),
}

impl From<MathError> for LiquidationError {
    fn from(_: MathError) -> Self {
        LiquidationError::DivisionByZero
    }
}

/// Collateralization tier a breached ratio falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationTier {
    /// `tp <= 120`: full seizure of the asset's locked collateral and holdings.
    Tp120,
    /// `120 < tp <= 130`: breach recorded, amounts not tracked at this tier.
    Tp130,
}

/// Detection outcome for one custodian and one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationDetail {
    pub tier: LiquidationTier,
    pub tp_value: u64,
    pub seized_collateral: u64,
    pub seized_pub_token: u64,
}

/// `floor(locked * 100 / holdings_in_collateral)` as an integer percentage.
pub fn tp_ratio(locked: u64, holdings_in_collateral: u64) -> Result<u64, LiquidationError> {
    if holdings_in_collateral == 0 {
        return Err(LiquidationError::DivisionByZero);
    }
    Ok(mul_div(locked, 100, holdings_in_collateral)?)
}

/// Ratio per asset for every asset the custodian both holds and has locked
/// collateral against. Assets with a zero leg are skipped, not errors.
pub fn tp_ratios(
    custodian: &Custodian,
    converter: &Converter<'_>,
) -> Result<BTreeMap<AssetId, u64>, LiquidationError> {
    let mut ratios = BTreeMap::new();
    for (&asset, &held) in &custodian.holding_pub_tokens {
        let locked = custodian.locked(asset);
        if held == 0 || locked == 0 {
            continue;
        }
        let value = converter.asset_to_collateral(asset, held)?;
        ratios.insert(asset, tp_ratio(locked, value)?);
    }
    Ok(ratios)
}

/// The inclusive tier bounds as classification inputs.
pub fn classify(tp_value: u64, tp120: u64, tp130: u64) -> Option<LiquidationTier> {
    if tp_value <= tp120 {
        Some(LiquidationTier::Tp120)
    } else if tp_value <= tp130 {
        Some(LiquidationTier::Tp130)
    } else {
        None
    }
}

/// Classifies every breached asset of a custodian. Tp120 details carry the
/// amounts to seize; Tp130 details carry zeros.
pub fn detect_liquidation(
    custodian: &Custodian,
    ratios: &BTreeMap<AssetId, u64>,
    tp120: u64,
    tp130: u64,
) -> BTreeMap<AssetId, LiquidationDetail> {
    let mut detected = BTreeMap::new();
    for (&asset, &tp_value) in ratios {
        let Some(tier) = classify(tp_value, tp120, tp130) else {
            continue;
        };
        let (seized_collateral, seized_pub_token) = match tier {
            LiquidationTier::Tp120 => (custodian.locked(asset), custodian.holding(asset)),
            LiquidationTier::Tp130 => (0, 0),
        };
        detected.insert(
            asset,
            LiquidationDetail {
                tier,
                tp_value,
                seized_collateral,
                seized_pub_token,
            },
        );
    }
    detected
}

/// Per-epoch accumulator of amounts seized from liquidated custodians.
/// Append-only within the epoch; the claims process debits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationPool {
    entries: BTreeMap<AssetId, PoolEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub free_collateral: u64,
    pub pub_token: u64,
}

impl LiquidationPool {
    pub fn entry(&self, asset: AssetId) -> Option<&PoolEntry> {
        self.entries.get(&asset)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, &PoolEntry)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum-merges a detection into the pool, creating the entry if absent.
    pub fn accumulate(&mut self, asset: AssetId, detail: &LiquidationDetail) {
        let entry = self.entries.entry(asset).or_default();
        entry.free_collateral += detail.seized_collateral;
        entry.pub_token += detail.seized_pub_token;
    }

    /// Redeems `amount` public tokens against the pool, paying out the
    /// proportional slice of seized collateral and debiting both legs.
    pub fn redeem(&mut self, asset: AssetId, amount: u64) -> Result<u64, LiquidationError> {
        let entry = self
            .entries
            .get_mut(&asset)
            .ok_or(LiquidationError::PoolEntryMissing(asset))?;
        let remaining_tokens = entry
            .pub_token
            .checked_sub(amount)
            .ok_or(LiquidationError::InsufficientPoolBalance(asset))?;

        let paid = pool_share(entry, amount)?;
        entry.free_collateral -= paid;
        entry.pub_token = remaining_tokens;
        Ok(paid)
    }
}

/// Collateral owed for redeeming `amount` tokens against a pool entry:
/// `floor(free_collateral * amount / pub_token)`.
pub fn pool_share(entry: &PoolEntry, amount: u64) -> Result<u64, LiquidationError> {
    if entry.pub_token == 0 {
        return Err(LiquidationError::DivisionByZero);
    }
    Ok(proportional_share(entry.free_collateral, amount, entry.pub_token)?)
}

/// How much collateral a breached custodian must add to restore 150% cover
/// for `asset`, optionally drawing on free collateral first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUp {
    /// Fresh deposit still needed after any free collateral is applied.
    pub deposit_needed: u64,
    /// Free collateral consumed by the top-up.
    pub free_collateral_used: u64,
    /// Free collateral left afterwards.
    pub free_collateral_remain: u64,
}

pub fn required_topup(
    custodian: &Custodian,
    converter: &Converter<'_>,
    asset: AssetId,
    use_free_collateral: bool,
) -> Result<TopUp, LiquidationError> {
    let target = converter.asset_to_collateral(asset, scale_up(custodian.holding(asset)))?;
    let shortfall = target.saturating_sub(custodian.locked(asset));

    if !use_free_collateral {
        return Ok(TopUp {
            deposit_needed: shortfall,
            free_collateral_used: 0,
            free_collateral_remain: 0,
        });
    }

    let free = custodian.free_collateral;
    if free >= shortfall {
        Ok(TopUp {
            deposit_needed: 0,
            free_collateral_used: shortfall,
            free_collateral_remain: free - shortfall,
        })
    } else {
        Ok(TopUp {
            deposit_needed: shortfall - free,
            free_collateral_used: free,
            free_collateral_remain: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateTable;
    use std::collections::BTreeSet;

    const COLLATERAL: AssetId = AssetId(0);
    const BTC: AssetId = AssetId(1);

    fn identity_converter() -> (RateTable, BTreeSet<AssetId>) {
        let mut t = RateTable::default();
        t.set_price(COLLATERAL, 1_000);
        t.set_price(BTC, 1_000);
        (t, [BTC].into_iter().collect())
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(classify(120, 120, 130), Some(LiquidationTier::Tp120));
        assert_eq!(classify(121, 120, 130), Some(LiquidationTier::Tp130));
        assert_eq!(classify(130, 120, 130), Some(LiquidationTier::Tp130));
        assert_eq!(classify(131, 120, 130), None);
        assert_eq!(classify(0, 120, 130), Some(LiquidationTier::Tp120));
    }

    #[test]
    fn ratio_is_floor_division() {
        // 1450 locked over holdings worth 1200 -> floor(120.83) = 120
        assert_eq!(tp_ratio(1450, 1200).unwrap(), 120);
        assert_eq!(tp_ratio(1500, 1000).unwrap(), 150);
    }

    #[test]
    fn ratio_divide_by_zero() {
        assert_eq!(
            tp_ratio(100, 0).unwrap_err(),
            LiquidationError::DivisionByZero
        );
    }

    #[test]
    fn tp120_detail_carries_amounts_tp130_does_not() {
        let mut c = Custodian::new("cus".into(), BTreeMap::new());
        c.deposit(10_000);
        c.lock_collateral(BTC, 1_200).unwrap();
        c.credit_holding(BTC, 1_000);

        let (t, sup) = identity_converter();
        let conv = Converter::new(&t, &sup, COLLATERAL);
        let ratios = tp_ratios(&c, &conv).unwrap();
        assert_eq!(ratios[&BTC], 120);

        let detected = detect_liquidation(&c, &ratios, 120, 130);
        let d = &detected[&BTC];
        assert_eq!(d.tier, LiquidationTier::Tp120);
        assert_eq!(d.seized_collateral, 1_200);
        assert_eq!(d.seized_pub_token, 1_000);

        // push the ratio to 125: breach recorded with zero amounts
        let mut c2 = c.clone();
        c2.lock_collateral(BTC, 50).unwrap();
        let ratios2 = tp_ratios(&c2, &conv).unwrap();
        assert_eq!(ratios2[&BTC], 125);
        let d2 = &detect_liquidation(&c2, &ratios2, 120, 130)[&BTC];
        assert_eq!(d2.tier, LiquidationTier::Tp130);
        assert_eq!(d2.seized_collateral, 0);
        assert_eq!(d2.seized_pub_token, 0);
    }

    #[test]
    fn healthy_custodian_detects_nothing() {
        let mut c = Custodian::new("cus".into(), BTreeMap::new());
        c.deposit(10_000);
        c.lock_collateral(BTC, 1_500).unwrap();
        c.credit_holding(BTC, 1_000);

        let (t, sup) = identity_converter();
        let conv = Converter::new(&t, &sup, COLLATERAL);
        let ratios = tp_ratios(&c, &conv).unwrap();
        assert_eq!(ratios[&BTC], 150);
        assert!(detect_liquidation(&c, &ratios, 120, 130).is_empty());
    }

    #[test]
    fn pool_accumulates_by_summation() {
        let mut pool = LiquidationPool::default();
        let d = LiquidationDetail {
            tier: LiquidationTier::Tp120,
            tp_value: 110,
            seized_collateral: 500,
            seized_pub_token: 400,
        };
        pool.accumulate(BTC, &d);
        pool.accumulate(BTC, &d);
        let e = pool.entry(BTC).unwrap();
        assert_eq!(e.free_collateral, 1_000);
        assert_eq!(e.pub_token, 800);
    }

    #[test]
    fn pool_redeem_pays_proportional_share() {
        let mut pool = LiquidationPool::default();
        pool.accumulate(
            BTC,
            &LiquidationDetail {
                tier: LiquidationTier::Tp120,
                tp_value: 100,
                seized_collateral: 900,
                seized_pub_token: 600,
            },
        );

        // 200 of 600 tokens -> 300 of 900 collateral
        assert_eq!(pool.redeem(BTC, 200).unwrap(), 300);
        let e = pool.entry(BTC).unwrap();
        assert_eq!(e.free_collateral, 600);
        assert_eq!(e.pub_token, 400);
    }

    #[test]
    fn pool_redeem_rejects_oversized_claim() {
        let mut pool = LiquidationPool::default();
        pool.accumulate(
            BTC,
            &LiquidationDetail {
                tier: LiquidationTier::Tp120,
                tp_value: 100,
                seized_collateral: 900,
                seized_pub_token: 600,
            },
        );
        let before = pool.clone();
        assert_eq!(
            pool.redeem(BTC, 601).unwrap_err(),
            LiquidationError::InsufficientPoolBalance(BTC)
        );
        assert_eq!(pool, before);
        assert_eq!(
            pool.redeem(AssetId(9), 1).unwrap_err(),
            LiquidationError::PoolEntryMissing(AssetId(9))
        );
    }

    #[test]
    fn topup_restores_full_cover() {
        let mut c = Custodian::new("cus".into(), BTreeMap::new());
        c.deposit(1_300);
        c.lock_collateral(BTC, 1_200).unwrap();
        c.credit_holding(BTC, 1_000);

        let (t, sup) = identity_converter();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        // target 1500, locked 1200 -> 300 short; 100 free available
        let plain = required_topup(&c, &conv, BTC, false).unwrap();
        assert_eq!(plain.deposit_needed, 300);

        let with_free = required_topup(&c, &conv, BTC, true).unwrap();
        assert_eq!(with_free.free_collateral_used, 100);
        assert_eq!(with_free.deposit_needed, 200);
        assert_eq!(with_free.free_collateral_remain, 0);
    }
}
