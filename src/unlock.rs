//! Unlock calculator: collateral a custodian recovers when a redeem completes
//! normally, and the compensation split when it completes via liquidation.
//!
//! The unlockable share is proportional to the redeemed amount over the
//! custodian's total exposure for the asset. Exposure counts current holdings
//! plus the amounts still assigned to the custodian in waiting redeems;
//! without the in-flight term, concurrent redeems against the same custodian
//! could each unlock a full share.

use crate::collateral::{mul_div, proportional_share, MathError};
use crate::rates::{Converter, RateError};
use crate::requests::MatchedRedeemCustodian;
use crate::state::PortalState;
use crate::types::{AssetId, IncAddress};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnlockError {
    #[error("custodian {0} not found")]
    CustodianNotFound(IncAddress),

    #[error("custodian has no exposure for the asset; share divides by zero")]
    DivisionByZero,

    #[error("computed unlock share is zero")]
    ZeroShare,

    #[error(transparent)]
    Rate(#[from] RateError),
}

impl From<MathError> for UnlockError {
    fn from(_: MathError) -> Self {
        UnlockError::DivisionByZero
    }
}

/// Collateral to unlock for `custodian` when `redeem_amount` of `asset` is
/// returned to a user.
pub fn unlock_amount(
    state: &PortalState,
    custodian: &str,
    asset: AssetId,
    redeem_amount: u64,
) -> Result<u64, UnlockError> {
    let record = state
        .custodians
        .get(custodian)
        .ok_or_else(|| UnlockError::CustodianNotFound(custodian.to_string()))?;

    // current holdings plus amounts matched to this custodian in every
    // waiting redeem for the asset (first matching entry per request)
    let mut total_holding = record.holding(asset);
    for waiting in state.waiting_redeems.values() {
        if waiting.asset != asset {
            continue;
        }
        if let Some(entry) = waiting.custodian_entry(custodian) {
            total_holding += entry.amount;
        }
    }

    if total_holding == 0 {
        return Err(UnlockError::DivisionByZero);
    }
    let unlocked = proportional_share(record.locked(asset), redeem_amount, total_holding)?;
    if unlocked == 0 {
        return Err(UnlockError::ZeroShare);
    }
    Ok(unlocked)
}

/// Split of a liquidated custodian's unlockable collateral between the
/// compensated redeemer and the custodian itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationSplit {
    /// Collateral seized and paid to the redeemer, capped at the total unlock.
    pub compensation: u64,
    /// Remainder returned to the custodian as freed collateral.
    pub returned: u64,
}

/// Compensation paid to a redeemer whose matched custodian was liquidated
/// before delivering funds: `compensation_percent` of the matched value,
/// converted to collateral and capped at the total unlockable amount.
pub fn unlock_after_liquidation(
    state: &PortalState,
    custodian: &str,
    matched: &MatchedRedeemCustodian,
    asset: AssetId,
    converter: &Converter<'_>,
    compensation_percent: u64,
) -> Result<LiquidationSplit, UnlockError> {
    let total_unlock = unlock_amount(state, custodian, asset, matched.amount)?;

    let compensation_in_asset = mul_div(matched.amount, compensation_percent, 100)?;
    let compensation = converter
        .asset_to_collateral(asset, compensation_in_asset)?
        .min(total_unlock);

    Ok(LiquidationSplit {
        compensation,
        returned: total_unlock - compensation,
    })
}
