// 10.0.2: result types and errors for engine operations.

use crate::custodian::CustodianError;
use crate::instructions::InstructionError;
use crate::liquidation::{LiquidationError, LiquidationTier};
use crate::rates::RateError;
use crate::requests::{MatchError, MatchedPortingCustodian, MatchedRedeemCustodian};
use crate::types::{AssetId, IncAddress, PortingId, RedeemId};
use crate::unlock::UnlockError;

#[derive(Debug, Clone)]
pub struct PortingOutcome {
    pub porting_id: PortingId,
    pub asset: AssetId,
    pub amount: u64,
    pub min_fee: u64,
    pub expiry_height: u64,
    pub custodians: Vec<MatchedPortingCustodian>,
}

#[derive(Debug, Clone)]
pub struct RedeemOutcome {
    pub redeem_id: RedeemId,
    pub asset: AssetId,
    pub amount: u64,
    pub min_fee: u64,
    pub custodians: Vec<MatchedRedeemCustodian>,
}

#[derive(Debug, Clone)]
pub struct UnlockOutcome {
    pub redeem_id: RedeemId,
    pub custodian: IncAddress,
    pub unlocked: u64,
    pub request_closed: bool,
}

#[derive(Debug, Clone)]
pub struct LiquidateOutcome {
    pub redeem_id: RedeemId,
    pub custodian: IncAddress,
    pub compensation: u64,
    pub returned: u64,
    pub request_closed: bool,
}

#[derive(Debug, Clone)]
pub struct LiquidationRecord {
    pub custodian: IncAddress,
    pub asset: AssetId,
    pub tier: LiquidationTier,
    pub tp_value: u64,
    pub seized_collateral: u64,
    pub seized_pub_token: u64,
}

#[derive(Debug, Clone)]
pub struct PoolRedeemOutcome {
    pub asset: AssetId,
    pub amount: u64,
    pub paid_collateral: u64,
}

/// Tally of one processed block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub height: u64,
    pub applied: usize,
    pub skipped: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("porting request {0} not found")]
    PortingNotFound(PortingId),

    #[error("porting id {0} already in use")]
    DuplicatePorting(PortingId),

    #[error("redeem request {0} not found")]
    RedeemNotFound(RedeemId),

    #[error("redeem id {0} already in use")]
    DuplicateRedeem(RedeemId),

    #[error("custodian {0} not found")]
    CustodianNotFound(IncAddress),

    #[error("custodian {0} is not matched to the request")]
    CustodianNotMatched(IncAddress),

    #[error("no exchange rates available for this block")]
    RatesUnavailable,

    #[error("rate error: {0}")]
    Rate(#[from] RateError),

    #[error("match error: {0}")]
    Match(#[from] MatchError),

    #[error("custodian state error: {0}")]
    Custodian(#[from] CustodianError),

    #[error("unlock error: {0}")]
    Unlock(#[from] UnlockError),

    #[error("liquidation error: {0}")]
    Liquidation(#[from] LiquidationError),

    #[error("instruction error: {0}")]
    Instruction(#[from] InstructionError),
}

impl EngineError {
    /// Pool-temporarily-short errors skip the instruction (the request can be
    /// retried later); everything else rejects it as malformed.
    pub fn is_liquidity_shortfall(&self) -> bool {
        matches!(
            self,
            EngineError::Match(MatchError::InsufficientCustodianLiquidity)
                | EngineError::Liquidation(LiquidationError::InsufficientPoolBalance(_))
        )
    }
}
