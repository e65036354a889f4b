// 10.1 engine/core.rs: owns the snapshot, the audit trail, and the block loop.

use super::config::{EngineConfig, PortalParams};
use super::results::{BlockSummary, EngineError};
use crate::events::{Event, EventId, EventPayload};
use crate::instructions::{Instruction, RawInstruction};
use crate::rates::RateTable;
use crate::state::PortalState;
use crate::store::{commit_state, load_state, StateStore, StoreError};

#[derive(Debug)]
pub struct PortalEngine {
    pub(super) config: EngineConfig,
    pub(super) state: PortalState,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) height: u64,
}

impl PortalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: PortalState::new(),
            events: Vec::new(),
            next_event_id: 1,
            height: 0,
        }
    }

    pub fn with_state(config: EngineConfig, state: PortalState) -> Self {
        Self {
            config,
            state,
            events: Vec::new(),
            next_event_id: 1,
            height: 0,
        }
    }

    /// Loads the snapshot persisted at `height` and starts processing there.
    pub fn load(
        config: EngineConfig,
        store: &dyn StateStore,
        height: u64,
    ) -> Result<Self, StoreError> {
        let state = load_state(store, height)?;
        let mut engine = Self::with_state(config, state);
        engine.height = height;
        Ok(engine)
    }

    /// Persists the snapshot keyed by the current height.
    pub fn commit(&self, store: &mut dyn StateStore) -> Result<(), StoreError> {
        commit_state(store, self.height, &self.state)
    }

    pub fn begin_block(&mut self, height: u64) {
        self.height = height;
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn params(&self) -> &PortalParams {
        &self.config.params
    }

    pub fn state(&self) -> &PortalState {
        &self.state
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    /// Applies one parsed instruction. The per-flow handlers all run through
    /// [`Self::transactional`], so an error here means the snapshot is
    /// exactly what it was before the call.
    pub fn apply(&mut self, instruction: Instruction) -> Result<(), EngineError> {
        match instruction {
            Instruction::RegisterCustodian {
                inc_address,
                collateral,
                remote_addresses,
            } => self.register_custodian(inc_address, collateral, remote_addresses),
            Instruction::TopUpCustodian { inc_address, amount } => {
                self.top_up_custodian(inc_address, amount)
            }
            Instruction::PortingRequest {
                porting_id,
                asset,
                amount,
            } => self.request_porting(porting_id, asset, amount).map(|_| ()),
            Instruction::CompleteMint { porting_id } => self.complete_mint(porting_id),
            Instruction::ExpirePortings => self.expire_portings().map(|_| ()),
            Instruction::RedeemRequest {
                redeem_id,
                redeemer,
                asset,
                amount,
            } => self
                .request_redeem(redeem_id, redeemer, asset, amount)
                .map(|_| ()),
            Instruction::CompleteRedeem {
                redeem_id,
                custodian,
            } => self.complete_redeem(redeem_id, custodian).map(|_| ()),
            Instruction::LiquidateCustodian {
                redeem_id,
                custodian,
            } => self.liquidate_custodian(redeem_id, custodian).map(|_| ()),
            Instruction::UpdateExchangeRates { rates } => self.update_exchange_rates(rates),
            Instruction::DetectLiquidations => self.detect_liquidations().map(|_| ()),
            Instruction::RedeemFromLiquidationPool {
                redeemer,
                asset,
                amount,
            } => self
                .redeem_from_liquidation_pool(redeemer, asset, amount)
                .map(|_| ()),
        }
    }

    /// Processes a whole block's instruction sequence in its agreed order.
    /// Malformed instructions are rejected, liquidity shortfalls are skipped;
    /// either way processing continues with the next instruction.
    pub fn process_block(&mut self, height: u64, raws: &[RawInstruction]) -> BlockSummary {
        self.begin_block(height);
        let mut summary = BlockSummary {
            height,
            ..BlockSummary::default()
        };

        for raw in raws {
            let instruction = match Instruction::parse(raw) {
                Ok(instruction) => instruction,
                Err(e) => {
                    summary.rejected += 1;
                    self.emit_event(EventPayload::InstructionRejected {
                        type_tag: raw.type_tag,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.apply(instruction) {
                Ok(()) => summary.applied += 1,
                Err(e) if e.is_liquidity_shortfall() => {
                    summary.skipped += 1;
                    self.emit_event(EventPayload::InstructionSkipped {
                        type_tag: raw.type_tag,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    summary.rejected += 1;
                    self.emit_event(EventPayload::InstructionRejected {
                        type_tag: raw.type_tag,
                        reason: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    /// Runs `op` against a scratch copy of the snapshot and commits it only
    /// on success, so multi-step mutations can never be observed half-done.
    pub(super) fn transactional<T>(
        &mut self,
        op: impl FnOnce(&mut PortalState, &PortalParams, u64) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut scratch = self.state.clone();
        let outcome = op(&mut scratch, &self.config.params, self.height)?;
        self.state = scratch;
        Ok(outcome)
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.height, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] h{} {:?}", event.id.0, event.height, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}

/// The block's validated rate table, cloned out of the snapshot so handlers
/// can hold a converter while mutating custodians.
pub(super) fn validated_rates(
    state: &PortalState,
    params: &PortalParams,
) -> Result<RateTable, EngineError> {
    let table = state.rates.as_ref().ok_or(EngineError::RatesUnavailable)?;
    table.validate(&params.supported_assets, params.collateral_asset)?;
    Ok(table.clone())
}
