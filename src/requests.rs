// 4.0: waiting porting/redeem requests and their matched-custodian details.
// a request enters the waiting set in Matched and leaves it on any terminal
// transition; it never re-enters Matched.

use crate::rates::RateError;
use crate::types::{AssetId, IncAddress, PortingId, RedeemId, RemoteAddress};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum MatchError {
    #[error("custodian pool cannot cover the requested amount")]
    InsufficientCustodianLiquidity,

    #[error(transparent)]
    Rate(#[from] RateError),
}

/// Status of a waiting request. Only `Matched` requests stay in the waiting
/// set; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Matched,
    Completed,
    Expired,
    PartiallyLiquidated,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Matched)
    }

    pub fn can_transition(&self, next: RequestStatus) -> bool {
        matches!(self, RequestStatus::Matched) && next.is_terminal()
    }
}

/// One custodian's slice of a porting match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPortingCustodian {
    pub inc_address: IncAddress,
    pub remote_address: RemoteAddress,
    /// Foreign-asset amount this custodian backs.
    pub amount: u64,
    /// Collateral locked against that amount (150% of its value).
    pub locked_collateral: u64,
    /// Free collateral the custodian retains after the lock.
    pub remain_collateral: u64,
}

/// One custodian's slice of a redeem match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRedeemCustodian {
    pub inc_address: IncAddress,
    pub remote_address: RemoteAddress,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingPorting {
    pub porting_id: PortingId,
    pub asset: AssetId,
    pub amount: u64,
    pub custodians: Vec<MatchedPortingCustodian>,
    pub expiry_height: u64,
}

impl WaitingPorting {
    pub fn matched_total(&self) -> u64 {
        self.custodians.iter().map(|c| c.amount).sum()
    }

    pub fn locked_total(&self) -> u64 {
        self.custodians.iter().map(|c| c.locked_collateral).sum()
    }

    pub fn is_expired(&self, height: u64) -> bool {
        height >= self.expiry_height
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingRedeem {
    pub redeem_id: RedeemId,
    pub redeemer: IncAddress,
    pub asset: AssetId,
    pub amount: u64,
    pub custodians: Vec<MatchedRedeemCustodian>,
}

impl WaitingRedeem {
    pub fn custodian_entry(&self, address: &str) -> Option<&MatchedRedeemCustodian> {
        self.custodians.iter().find(|c| c.inc_address == address)
    }

    /// Drops a custodian from the match list once it delivered or was
    /// liquidated. Returns false when the address was never matched.
    pub fn remove_custodian(&mut self, address: &str) -> bool {
        let before = self.custodians.len();
        self.custodians.retain(|c| c.inc_address != address);
        self.custodians.len() != before
    }

    pub fn matched_total(&self) -> u64 {
        self.custodians.iter().map(|c| c.amount).sum()
    }
}
