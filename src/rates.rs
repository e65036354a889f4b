//! Exchange rate table and conversion between assets.
//!
//! Every supported asset has a price expressed in a common nano-denominated
//! pivot unit. Converting between two assets goes through the pivot:
//! `floor(amount * price_from / price_to)`. The table must be validated once
//! per block before any conversion runs.

use crate::collateral::{mul_div, MathError};
use crate::types::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum RateError {
    #[error("{0} is not a supported portal asset")]
    UnsupportedAsset(AssetId),

    #[error("rate table has no entry for {0}")]
    RatesMissing(AssetId),

    #[error("rate conversion divided by zero")]
    DivisionByZero,
}

impl From<MathError> for RateError {
    fn from(_: MathError) -> Self {
        RateError::DivisionByZero
    }
}

/// Pivot price table for one block. BTreeMap keeps iteration order part of the
/// consensus contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    rates: BTreeMap<AssetId, u64>,
}

impl RateTable {
    pub fn new(rates: BTreeMap<AssetId, u64>) -> Self {
        Self { rates }
    }

    pub fn price(&self, asset: AssetId) -> Option<u64> {
        self.rates.get(&asset).copied()
    }

    pub fn set_price(&mut self, asset: AssetId, price: u64) {
        self.rates.insert(asset, price);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Requires an entry for every supported foreign asset and for the
    /// collateral asset. Must pass before any conversion in a block.
    pub fn validate(
        &self,
        supported: &BTreeSet<AssetId>,
        collateral: AssetId,
    ) -> Result<(), RateError> {
        for asset in supported {
            if !self.rates.contains_key(asset) {
                return Err(RateError::RatesMissing(*asset));
            }
        }
        if !self.rates.contains_key(&collateral) {
            return Err(RateError::RatesMissing(collateral));
        }
        Ok(())
    }
}

/// `floor(amount * price_from / price_to)` over a 128-bit intermediate.
pub fn convert(amount: u64, price_from: u64, price_to: u64) -> Result<u64, RateError> {
    Ok(mul_div(amount, price_from, price_to)?)
}

/// Converts between a foreign asset and the native collateral asset through a
/// validated rate table. Built once per instruction from the current snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    table: &'a RateTable,
    supported: &'a BTreeSet<AssetId>,
    collateral: AssetId,
}

impl<'a> Converter<'a> {
    pub fn new(table: &'a RateTable, supported: &'a BTreeSet<AssetId>, collateral: AssetId) -> Self {
        Self {
            table,
            supported,
            collateral,
        }
    }

    fn pair(&self, asset: AssetId) -> Result<(u64, u64), RateError> {
        if !self.supported.contains(&asset) {
            return Err(RateError::UnsupportedAsset(asset));
        }
        let asset_price = self
            .table
            .price(asset)
            .ok_or(RateError::RatesMissing(asset))?;
        let collateral_price = self
            .table
            .price(self.collateral)
            .ok_or(RateError::RatesMissing(self.collateral))?;
        Ok((asset_price, collateral_price))
    }

    /// Value of `amount` of `asset` in collateral units.
    pub fn asset_to_collateral(&self, asset: AssetId, amount: u64) -> Result<u64, RateError> {
        let (asset_price, collateral_price) = self.pair(asset)?;
        convert(amount, asset_price, collateral_price)
    }

    /// Amount of `asset` that `amount` collateral units buy.
    pub fn collateral_to_asset(&self, asset: AssetId, amount: u64) -> Result<u64, RateError> {
        let (asset_price, collateral_price) = self.pair(asset)?;
        convert(amount, collateral_price, asset_price)
    }
}
