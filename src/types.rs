// 1.0: primitives for the portal engine. asset ids, addresses, request ids.
// amounts stay bare u64 (nano-denominated) because every arithmetic step routes
// through explicit u128 helpers; a newtype would only hide the widening.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a portable foreign asset (or the native collateral asset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

// Custodian payment address on the portal chain.
pub type IncAddress = String;

// Custodian receiving address on the external chain, one per asset.
pub type RemoteAddress = String;

/// Unique identifier of a porting (mint) request, chosen by the requester.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortingId(pub String);

/// Unique identifier of a redeem (burn) request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RedeemId(pub String);

impl fmt::Display for PortingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RedeemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
