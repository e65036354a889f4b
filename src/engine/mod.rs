// 10.0: block-processing engine. applies the agreed instruction sequence to
// one exclusively-owned snapshot, sequentially and deterministically; every
// instruction either commits in full or leaves the snapshot untouched.

mod config;
mod core;
mod liquidate;
mod porting;
mod redeem;
mod results;

pub use config::{EngineConfig, PortalParams};
pub use core::PortalEngine;
pub use results::{
    BlockSummary, EngineError, LiquidateOutcome, LiquidationRecord, PoolRedeemOutcome,
    PortingOutcome, RedeemOutcome, UnlockOutcome,
};
