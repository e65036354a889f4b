//! Liquidation handlers: per-redeem custodian liquidation, rate updates,
//! portfolio-wide top-percentile detection, and the liquidation pool.

use std::collections::BTreeMap;

use super::core::{validated_rates, PortalEngine};
use super::results::{EngineError, LiquidateOutcome, LiquidationRecord, PoolRedeemOutcome};
use crate::events::EventPayload;
use crate::liquidation::{detect_liquidation, tp_ratios};
use crate::rates::{Converter, RateTable};
use crate::types::{AssetId, IncAddress, RedeemId};
use crate::unlock::unlock_after_liquidation;

impl PortalEngine {
    /// A matched custodian failed to deliver a redeem in time. Its collateral
    /// stake for that match is split: compensation to the redeemer, the rest
    /// back to the custodian's free balance.
    pub fn liquidate_custodian(
        &mut self,
        redeem_id: RedeemId,
        custodian: IncAddress,
    ) -> Result<LiquidateOutcome, EngineError> {
        let outcome = self.transactional(|state, params, _height| {
            let waiting = state
                .waiting_redeems
                .get(&redeem_id)
                .ok_or_else(|| EngineError::RedeemNotFound(redeem_id.clone()))?;
            let asset = waiting.asset;
            let matched = waiting
                .custodian_entry(&custodian)
                .ok_or_else(|| EngineError::CustodianNotMatched(custodian.clone()))?
                .clone();

            let table = validated_rates(state, params)?;
            let converter =
                Converter::new(&table, &params.supported_assets, params.collateral_asset);
            let split = unlock_after_liquidation(
                state,
                &custodian,
                &matched,
                asset,
                &converter,
                params.compensation_percent,
            )?;

            state
                .custodians
                .get_mut(&custodian)
                .ok_or_else(|| EngineError::CustodianNotFound(custodian.clone()))?
                .apply_liquidation(asset, split.compensation, split.returned)?;

            let waiting = state
                .waiting_redeems
                .get_mut(&redeem_id)
                .ok_or_else(|| EngineError::RedeemNotFound(redeem_id.clone()))?;
            waiting.remove_custodian(&custodian);
            let request_closed = waiting.custodians.is_empty();
            if request_closed {
                state.waiting_redeems.remove(&redeem_id);
            }

            Ok(LiquidateOutcome {
                redeem_id: redeem_id.clone(),
                custodian: custodian.clone(),
                compensation: split.compensation,
                returned: split.returned,
                request_closed,
            })
        })?;

        self.emit_event(EventPayload::CustodianLiquidated {
            redeem_id: outcome.redeem_id.clone(),
            custodian: outcome.custodian.clone(),
            compensation: outcome.compensation,
            returned: outcome.returned,
            request_closed: outcome.request_closed,
        });
        Ok(outcome)
    }

    /// Replaces the exchange rate snapshot. The new table must quote the
    /// collateral asset and every supported asset or the whole update is
    /// rejected.
    pub fn update_exchange_rates(
        &mut self,
        rates: BTreeMap<AssetId, u64>,
    ) -> Result<(), EngineError> {
        let assets = self.transactional(|state, params, _height| {
            let table = RateTable::new(rates.clone());
            table.validate(&params.supported_assets, params.collateral_asset)?;
            let assets = table.len();
            state.rates = Some(table);
            Ok(assets)
        })?;

        self.emit_event(EventPayload::RatesUpdated { assets });
        Ok(())
    }

    /// Sweeps every custodian for positions at or below the liquidation
    /// thresholds. At the deep tier the seized holdings and their backing
    /// collateral move into the epoch's liquidation pool; at the shallow
    /// tier the position is flagged with zero amounts.
    pub fn detect_liquidations(&mut self) -> Result<Vec<LiquidationRecord>, EngineError> {
        let records = self.transactional(|state, params, _height| {
            let table = validated_rates(state, params)?;
            let converter =
                Converter::new(&table, &params.supported_assets, params.collateral_asset);

            let addresses: Vec<IncAddress> = state.custodians.addresses().cloned().collect();
            let mut records = Vec::new();
            for address in addresses {
                let custodian = state
                    .custodians
                    .get(&address)
                    .ok_or_else(|| EngineError::CustodianNotFound(address.clone()))?;
                let ratios = tp_ratios(custodian, &converter)?;
                let detected = detect_liquidation(custodian, &ratios, params.tp120, params.tp130);

                for (asset, detail) in detected {
                    let custodian = state
                        .custodians
                        .get_mut(&address)
                        .ok_or_else(|| EngineError::CustodianNotFound(address.clone()))?;
                    custodian.debit_holding(asset, detail.seized_pub_token)?;
                    custodian.apply_liquidation(asset, detail.seized_collateral, 0)?;
                    state.liquidation_pool.accumulate(asset, &detail);

                    records.push(LiquidationRecord {
                        custodian: address.clone(),
                        asset,
                        tier: detail.tier,
                        tp_value: detail.tp_value,
                        seized_collateral: detail.seized_collateral,
                        seized_pub_token: detail.seized_pub_token,
                    });
                }
            }
            Ok(records)
        })?;

        for record in &records {
            self.emit_event(EventPayload::LiquidationDetected {
                custodian: record.custodian.clone(),
                asset: record.asset,
                tier: record.tier,
                tp_value: record.tp_value,
                seized_collateral: record.seized_collateral,
                seized_pub_token: record.seized_pub_token,
            });
        }
        Ok(records)
    }

    /// Burns public tokens against the liquidation pool for a proportional
    /// slice of its seized collateral.
    pub fn redeem_from_liquidation_pool(
        &mut self,
        redeemer: IncAddress,
        asset: AssetId,
        amount: u64,
    ) -> Result<PoolRedeemOutcome, EngineError> {
        let outcome = self.transactional(|state, _params, _height| {
            let paid_collateral = state.liquidation_pool.redeem(asset, amount)?;
            Ok(PoolRedeemOutcome {
                asset,
                amount,
                paid_collateral,
            })
        })?;

        self.emit_event(EventPayload::LiquidationPoolRedeemed {
            redeemer,
            asset: outcome.asset,
            amount: outcome.amount,
            paid_collateral: outcome.paid_collateral,
        });
        Ok(outcome)
    }
}
