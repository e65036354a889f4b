//! The agreed instruction sequence, as a closed set of variants.
//!
//! Instructions arrive from consensus as opaque `(type_tag, shard_id,
//! payload)` triples; only the tag is needed to dispatch, and each payload
//! deserializes into one variant of [`Instruction`]. Unknown tags and
//! malformed payloads are rejected without touching state.

use crate::types::{AssetId, IncAddress, PortingId, RedeemId, RemoteAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod tags {
    pub const REGISTER_CUSTODIAN: u8 = 10;
    pub const TOP_UP_CUSTODIAN: u8 = 11;
    pub const PORTING_REQUEST: u8 = 20;
    pub const COMPLETE_MINT: u8 = 21;
    pub const EXPIRE_PORTINGS: u8 = 22;
    pub const REDEEM_REQUEST: u8 = 30;
    pub const COMPLETE_REDEEM: u8 = 31;
    pub const LIQUIDATE_CUSTODIAN: u8 = 32;
    pub const UPDATE_EXCHANGE_RATES: u8 = 40;
    pub const DETECT_LIQUIDATIONS: u8 = 41;
    pub const REDEEM_FROM_LIQUIDATION_POOL: u8 = 42;
}

const KNOWN_TAGS: &[u8] = &[
    tags::REGISTER_CUSTODIAN,
    tags::TOP_UP_CUSTODIAN,
    tags::PORTING_REQUEST,
    tags::COMPLETE_MINT,
    tags::EXPIRE_PORTINGS,
    tags::REDEEM_REQUEST,
    tags::COMPLETE_REDEEM,
    tags::LIQUIDATE_CUSTODIAN,
    tags::UPDATE_EXCHANGE_RATES,
    tags::DETECT_LIQUIDATIONS,
    tags::REDEEM_FROM_LIQUIDATION_POOL,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstructionError {
    #[error("unknown instruction type tag {0}")]
    UnknownTypeTag(u8),

    #[error("malformed instruction payload: {0}")]
    MalformedPayload(String),

    #[error("payload does not match type tag {expected} (decoded {decoded})")]
    TagMismatch { expected: u8, decoded: u8 },
}

/// Wire shape of one consensus instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstruction {
    pub type_tag: u8,
    pub shard_id: u8,
    pub payload: Vec<u8>,
}

/// Every instruction kind the engine processes, matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    RegisterCustodian {
        inc_address: IncAddress,
        collateral: u64,
        remote_addresses: BTreeMap<AssetId, RemoteAddress>,
    },
    TopUpCustodian {
        inc_address: IncAddress,
        amount: u64,
    },
    PortingRequest {
        porting_id: PortingId,
        asset: AssetId,
        amount: u64,
    },
    CompleteMint {
        porting_id: PortingId,
    },
    ExpirePortings,
    RedeemRequest {
        redeem_id: RedeemId,
        redeemer: IncAddress,
        asset: AssetId,
        amount: u64,
    },
    CompleteRedeem {
        redeem_id: RedeemId,
        custodian: IncAddress,
    },
    LiquidateCustodian {
        redeem_id: RedeemId,
        custodian: IncAddress,
    },
    UpdateExchangeRates {
        rates: BTreeMap<AssetId, u64>,
    },
    DetectLiquidations,
    RedeemFromLiquidationPool {
        redeemer: IncAddress,
        asset: AssetId,
        amount: u64,
    },
}

impl Instruction {
    pub fn type_tag(&self) -> u8 {
        match self {
            Instruction::RegisterCustodian { .. } => tags::REGISTER_CUSTODIAN,
            Instruction::TopUpCustodian { .. } => tags::TOP_UP_CUSTODIAN,
            Instruction::PortingRequest { .. } => tags::PORTING_REQUEST,
            Instruction::CompleteMint { .. } => tags::COMPLETE_MINT,
            Instruction::ExpirePortings => tags::EXPIRE_PORTINGS,
            Instruction::RedeemRequest { .. } => tags::REDEEM_REQUEST,
            Instruction::CompleteRedeem { .. } => tags::COMPLETE_REDEEM,
            Instruction::LiquidateCustodian { .. } => tags::LIQUIDATE_CUSTODIAN,
            Instruction::UpdateExchangeRates { .. } => tags::UPDATE_EXCHANGE_RATES,
            Instruction::DetectLiquidations => tags::DETECT_LIQUIDATIONS,
            Instruction::RedeemFromLiquidationPool { .. } => {
                tags::REDEEM_FROM_LIQUIDATION_POOL
            }
        }
    }

    /// Decodes a raw consensus instruction, checking the tag both before and
    /// after decoding.
    pub fn parse(raw: &RawInstruction) -> Result<Self, InstructionError> {
        if !KNOWN_TAGS.contains(&raw.type_tag) {
            return Err(InstructionError::UnknownTypeTag(raw.type_tag));
        }
        let decoded: Instruction = serde_json::from_slice(&raw.payload)
            .map_err(|e| InstructionError::MalformedPayload(e.to_string()))?;
        if decoded.type_tag() != raw.type_tag {
            return Err(InstructionError::TagMismatch {
                expected: raw.type_tag,
                decoded: decoded.type_tag(),
            });
        }
        Ok(decoded)
    }

    /// Encodes for the wire; used by the simulator and tests.
    pub fn to_raw(&self, shard_id: u8) -> RawInstruction {
        let payload = serde_json::to_vec(self).unwrap_or_default();
        RawInstruction {
            type_tag: self.type_tag(),
            shard_id,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_the_wire_shape() {
        let inst = Instruction::RedeemRequest {
            redeem_id: RedeemId("r-1".into()),
            redeemer: "user".into(),
            asset: AssetId(1),
            amount: 70,
        };
        let raw = inst.to_raw(3);
        assert_eq!(raw.type_tag, tags::REDEEM_REQUEST);
        assert_eq!(raw.shard_id, 3);
        assert_eq!(Instruction::parse(&raw).unwrap(), inst);
    }

    #[test]
    fn unknown_tag_is_rejected_before_decoding() {
        let raw = RawInstruction {
            type_tag: 99,
            shard_id: 0,
            payload: b"not even json".to_vec(),
        };
        assert_eq!(
            Instruction::parse(&raw).unwrap_err(),
            InstructionError::UnknownTypeTag(99)
        );
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let raw = RawInstruction {
            type_tag: tags::PORTING_REQUEST,
            shard_id: 0,
            payload: b"{\"nope\":1}".to_vec(),
        };
        assert!(matches!(
            Instruction::parse(&raw).unwrap_err(),
            InstructionError::MalformedPayload(_)
        ));
    }

    #[test]
    fn tag_payload_mismatch_is_rejected() {
        let mut raw = Instruction::ExpirePortings.to_raw(0);
        raw.type_tag = tags::COMPLETE_MINT;
        assert_eq!(
            Instruction::parse(&raw).unwrap_err(),
            InstructionError::TagMismatch {
                expected: tags::COMPLETE_MINT,
                decoded: tags::EXPIRE_PORTINGS,
            }
        );
    }
}
