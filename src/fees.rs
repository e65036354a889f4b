// 6.0: minimum fee floors for porting and redeem requests, denominated in
// collateral units. fees are a fraction of the request's collateral value in
// basis points, rounded half up.

use crate::rates::{Converter, RateError};
use crate::types::AssetId;

// round-half-up fraction of `value` given in basis points (100 bps = 1%)
fn fee_from_bps(value: u64, bps: u64) -> u64 {
    let wide = (value as u128 * bps as u128 + 5_000) / 10_000;
    u64::try_from(wide).unwrap_or(u64::MAX)
}

/// Minimum fee for porting `amount` of `asset`.
pub fn min_porting_fee(
    converter: &Converter<'_>,
    asset: AssetId,
    amount: u64,
    fee_bps: u64,
) -> Result<u64, RateError> {
    let value = converter.asset_to_collateral(asset, amount)?;
    Ok(fee_from_bps(value, fee_bps))
}

/// Minimum fee for redeeming `amount` of `asset`.
pub fn min_redeem_fee(
    converter: &Converter<'_>,
    asset: AssetId,
    amount: u64,
    fee_bps: u64,
) -> Result<u64, RateError> {
    let value = converter.asset_to_collateral(asset, amount)?;
    Ok(fee_from_bps(value, fee_bps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateTable;
    use std::collections::BTreeSet;

    const COLLATERAL: AssetId = AssetId(0);
    const BTC: AssetId = AssetId(1);

    #[test]
    fn fee_rounds_half_up() {
        // 0.01% of 1_000_000 = 100
        assert_eq!(fee_from_bps(1_000_000, 1), 100);
        // 0.01% of 5_000 = 0.5 -> 1
        assert_eq!(fee_from_bps(5_000, 1), 1);
        // 0.01% of 4_999 = 0.4999 -> 0
        assert_eq!(fee_from_bps(4_999, 1), 0);
    }

    #[test]
    fn fee_is_charged_on_collateral_value() {
        let mut t = RateTable::default();
        t.set_price(COLLATERAL, 500);
        t.set_price(BTC, 20_000);
        let sup: BTreeSet<AssetId> = [BTC].into_iter().collect();
        let conv = Converter::new(&t, &sup, COLLATERAL);

        // 1000 BTC units = 40_000 collateral units; 0.01% = 4
        assert_eq!(min_porting_fee(&conv, BTC, 1_000, 1).unwrap(), 4);
        assert_eq!(min_redeem_fee(&conv, BTC, 1_000, 1).unwrap(), 4);
    }
}
