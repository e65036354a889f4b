// portal-core: collateral-backed porting and redeem engine.
// consensus-first architecture: every balance mutation is integer-exact
// and deterministic, with no external I/O in the state transition.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, IncAddress, PortingId, RedeemId
//   2.x  collateral.rs: integer collateral math, 150% scaling
//   3.x  rates.rs: exchange rate table and cross-asset conversion
//   4.x  custodian.rs: custodian balances and the custodian pool
//   5.x  requests.rs: waiting porting/redeem requests and match entries
//   6.x  porting.rs: porting match planner (single + multi custodian)
//   6.1  redeem.rs: redeem match planner against holdings
//   7.x  liquidation.rs: tp ratios, tier detection, liquidation pool
//   7.1  unlock.rs: proportional collateral unlock, liquidation split
//   7.2  fees.rs: minimum porting/redeem fees in basis points
//   8.x  state.rs: the portal state snapshot
//   9.x  instructions.rs: typed instruction set + wire parsing
//   10.x engine/: block processor: matching, delivery, liquidation
//   11.x store.rs: per-height state persistence (mocked)
//   11.1 headers.rs: remote chain header lookups (mocked)
//   12.x events.rs: state transition events for audit

// core portal modules
pub mod collateral;
pub mod custodian;
pub mod engine;
pub mod events;
pub mod fees;
pub mod liquidation;
pub mod porting;
pub mod rates;
pub mod redeem;
pub mod requests;
pub mod state;
pub mod types;
pub mod unlock;

// integration modules
pub mod headers;
pub mod instructions;
pub mod store;

// re exports for convenience
pub use collateral::*;
pub use custodian::*;
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use liquidation::*;
pub use porting::*;
pub use rates::*;
pub use redeem::*;
pub use requests::*;
pub use state::*;
pub use types::*;
pub use unlock::*;
pub use headers::{HeaderError, HeaderProvider, MockHeaderProvider, RemoteHeader};
pub use instructions::{Instruction, InstructionError, RawInstruction};
pub use store::{MemoryStore, StateCategory, StateKey, StateStore, StoreError};
