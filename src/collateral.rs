// 2.0: collateral arithmetic. every ratio in the protocol is fixed-point floor
// division over u128 intermediates; results must be bit-identical on every node.

use serde::{Deserialize, Serialize};

// Over-collateralization ratio: 150% of the minted value must be locked.
pub const OVER_COLLATERAL_NUM: u64 = 150;
pub const OVER_COLLATERAL_DENOM: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
}

// results are nano amounts and are assumed to fit 64 bits; saturate rather than
// wrap if a malformed rate table ever pushes a quotient past u64::MAX.
fn narrow(wide: u128) -> u64 {
    u64::try_from(wide).unwrap_or(u64::MAX)
}

/// `floor(amount * num / denom)` with a 128-bit intermediate product.
pub fn mul_div(amount: u64, num: u64, denom: u64) -> Result<u64, MathError> {
    if denom == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(narrow(amount as u128 * num as u128 / denom as u128))
}

/// Scales a minted amount up to its 150% over-collateralized equivalent.
pub fn scale_up(amount: u64) -> u64 {
    narrow(amount as u128 * OVER_COLLATERAL_NUM as u128 / OVER_COLLATERAL_DENOM as u128)
}

/// Inverse of [`scale_up`]. Lossy: `scale_down(scale_up(x))` may truncate below `x`.
pub fn scale_down(amount: u64) -> u64 {
    narrow(amount as u128 * OVER_COLLATERAL_DENOM as u128 / OVER_COLLATERAL_NUM as u128)
}

/// `floor(total * part / denominator)`: the share of `total` that `part` of
/// `denominator` is entitled to.
pub fn proportional_share(total: u64, part: u64, denominator: u64) -> Result<u64, MathError> {
    mul_div(total, part, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_up_floors() {
        // 1 * 150 / 100 = 1.5 -> 1
        assert_eq!(scale_up(1), 1);
        assert_eq!(scale_up(2), 3);
        assert_eq!(scale_up(100), 150);
    }

    #[test]
    fn scale_round_trip_is_lossy() {
        assert_eq!(scale_down(scale_up(1)), 0);
        assert_eq!(scale_down(scale_up(100)), 100);
        assert_eq!(scale_down(scale_up(3)), 2);
    }

    #[test]
    fn scale_preserves_order() {
        let xs = [0u64, 1, 2, 3, 99, 100, 101, 1_000_000_007];
        for w in xs.windows(2) {
            assert!(scale_up(w[0]) <= scale_up(w[1]));
            assert!(scale_down(w[0]) <= scale_down(w[1]));
        }
    }

    #[test]
    fn large_inputs_do_not_overflow() {
        // u64::MAX * 150 exceeds 64 bits; the intermediate must widen.
        assert_eq!(scale_down(u64::MAX), ((u64::MAX as u128 * 100) / 150) as u64);
    }

    #[test]
    fn proportional_share_floors() {
        assert_eq!(proportional_share(1000, 1, 3).unwrap(), 333);
        assert_eq!(proportional_share(7, 3, 2).unwrap(), 10);
    }

    #[test]
    fn proportional_share_zero_denominator() {
        assert_eq!(
            proportional_share(10, 1, 0).unwrap_err(),
            MathError::DivisionByZero
        );
    }
}
