// 9.0: every state transition produces an event. used for audit trails and
// state reconstruction; ordering is (height, event id), never wall-clock time.

use crate::liquidation::LiquidationTier;
use crate::types::{AssetId, IncAddress, PortingId, RedeemId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub height: u64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, height: u64, payload: EventPayload) -> Self {
        Self { id, height, payload }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // custodian lifecycle
    CustodianRegistered {
        inc_address: IncAddress,
        collateral: u64,
    },
    CollateralDeposited {
        inc_address: IncAddress,
        amount: u64,
        new_free: u64,
    },

    // porting flow
    PortingMatched {
        porting_id: PortingId,
        asset: AssetId,
        amount: u64,
        custodians: usize,
        min_fee: u64,
    },
    MintCompleted {
        porting_id: PortingId,
        asset: AssetId,
        amount: u64,
    },
    PortingExpired {
        porting_id: PortingId,
        asset: AssetId,
        unlocked: u64,
    },

    // redeem flow
    RedeemMatched {
        redeem_id: RedeemId,
        asset: AssetId,
        amount: u64,
        custodians: usize,
        min_fee: u64,
    },
    RedeemCompleted {
        redeem_id: RedeemId,
        custodian: IncAddress,
        unlocked: u64,
        request_closed: bool,
    },
    CustodianLiquidated {
        redeem_id: RedeemId,
        custodian: IncAddress,
        compensation: u64,
        returned: u64,
        request_closed: bool,
    },

    // rate-driven liquidation
    RatesUpdated {
        assets: usize,
    },
    LiquidationDetected {
        custodian: IncAddress,
        asset: AssetId,
        tier: LiquidationTier,
        tp_value: u64,
        seized_collateral: u64,
        seized_pub_token: u64,
    },
    LiquidationPoolRedeemed {
        redeemer: IncAddress,
        asset: AssetId,
        amount: u64,
        paid_collateral: u64,
    },

    // instruction outcomes that changed nothing
    InstructionRejected {
        type_tag: u8,
        reason: String,
    },
    InstructionSkipped {
        type_tag: u8,
        reason: String,
    },
}
