// 7.0 store.rs: state store adapter. the engine only needs load/store by key;
// the trie-backed database behind it is someone else's problem. MemoryStore
// stands in for it in tests and the simulator.

use crate::custodian::CustodianPool;
use crate::liquidation::LiquidationPool;
use crate::rates::RateTable;
use crate::requests::{WaitingPorting, WaitingRedeem};
use crate::state::{LockedCollateral, PortalState};
use crate::types::{PortingId, RedeemId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    CustodianPool,
    WaitingPorting,
    WaitingRedeem,
    ExchangeRates,
    LiquidationPool,
    LockedCollateral,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pub category: StateCategory,
    pub height: u64,
    pub id: String,
}

impl StateKey {
    pub fn new(category: StateCategory, height: u64, id: impl Into<String>) -> Self {
        Self {
            category,
            height,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("state codec failure: {0}")]
    Codec(String),
}

pub trait StateStore {
    fn load(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StoreError>;
    fn store(&mut self, key: StateKey, value: Vec<u8>) -> Result<(), StoreError>;
}

/// In-memory store for tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<StateKey, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &StateKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: StateKey, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key, value);
        Ok(())
    }
}

fn load_component<T: DeserializeOwned + Default>(
    store: &dyn StateStore,
    category: StateCategory,
    height: u64,
) -> Result<T, StoreError> {
    match store.load(&StateKey::new(category, height, ""))? {
        Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Codec(e.to_string())),
        None => Ok(T::default()),
    }
}

fn store_component<T: Serialize>(
    store: &mut dyn StateStore,
    category: StateCategory,
    height: u64,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Codec(e.to_string()))?;
    store.store(StateKey::new(category, height, ""), bytes)
}

/// Loads the whole snapshot persisted at `height`; missing components default
/// to empty, so a fresh chain starts from an empty portal.
pub fn load_state(store: &dyn StateStore, height: u64) -> Result<PortalState, StoreError> {
    Ok(PortalState {
        custodians: load_component::<CustodianPool>(store, StateCategory::CustodianPool, height)?,
        waiting_portings: load_component::<BTreeMap<PortingId, WaitingPorting>>(
            store,
            StateCategory::WaitingPorting,
            height,
        )?,
        waiting_redeems: load_component::<BTreeMap<RedeemId, WaitingRedeem>>(
            store,
            StateCategory::WaitingRedeem,
            height,
        )?,
        rates: load_component::<Option<RateTable>>(store, StateCategory::ExchangeRates, height)?,
        liquidation_pool: load_component::<LiquidationPool>(
            store,
            StateCategory::LiquidationPool,
            height,
        )?,
        locked_collateral: load_component::<LockedCollateral>(
            store,
            StateCategory::LockedCollateral,
            height,
        )?,
    })
}

/// Persists every snapshot component keyed by `height`.
pub fn commit_state(
    store: &mut dyn StateStore,
    height: u64,
    state: &PortalState,
) -> Result<(), StoreError> {
    store_component(store, StateCategory::CustodianPool, height, &state.custodians)?;
    store_component(
        store,
        StateCategory::WaitingPorting,
        height,
        &state.waiting_portings,
    )?;
    store_component(
        store,
        StateCategory::WaitingRedeem,
        height,
        &state.waiting_redeems,
    )?;
    store_component(store, StateCategory::ExchangeRates, height, &state.rates)?;
    store_component(
        store,
        StateCategory::LiquidationPool,
        height,
        &state.liquidation_pool,
    )?;
    store_component(
        store,
        StateCategory::LockedCollateral,
        height,
        &state.locked_collateral,
    )?;
    Ok(())
}
