//! The redeem (burn) flow: matching, delivery, collateral unlock.

use super::core::{validated_rates, PortalEngine};
use super::results::{EngineError, RedeemOutcome, UnlockOutcome};
use crate::events::EventPayload;
use crate::fees::min_redeem_fee;
use crate::rates::Converter;
use crate::redeem::plan_redeem_match;
use crate::requests::WaitingRedeem;
use crate::types::{AssetId, IncAddress, RedeemId};
use crate::unlock::unlock_amount;

impl PortalEngine {
    /// Matches a redeem request against custodian holdings. Matched amounts
    /// move out of the custodians' attested holdings and live on the waiting
    /// request until delivery.
    pub fn request_redeem(
        &mut self,
        redeem_id: RedeemId,
        redeemer: IncAddress,
        asset: AssetId,
        amount: u64,
    ) -> Result<RedeemOutcome, EngineError> {
        let outcome = self.transactional(|state, params, _height| {
            if state.waiting_redeems.contains_key(&redeem_id) {
                return Err(EngineError::DuplicateRedeem(redeem_id.clone()));
            }

            let table = validated_rates(state, params)?;
            let converter =
                Converter::new(&table, &params.supported_assets, params.collateral_asset);

            let plan = plan_redeem_match(&state.custodians, asset, amount)?;
            let min_fee = min_redeem_fee(&converter, asset, amount, params.redeem_fee_bps)?;

            for entry in &plan {
                let custodian = state
                    .custodians
                    .get_mut(&entry.inc_address)
                    .ok_or_else(|| EngineError::CustodianNotFound(entry.inc_address.clone()))?;
                custodian.debit_holding(asset, entry.amount)?;
            }

            state.waiting_redeems.insert(
                redeem_id.clone(),
                WaitingRedeem {
                    redeem_id: redeem_id.clone(),
                    redeemer: redeemer.clone(),
                    asset,
                    amount,
                    custodians: plan.clone(),
                },
            );

            Ok(RedeemOutcome {
                redeem_id: redeem_id.clone(),
                asset,
                amount,
                min_fee,
                custodians: plan,
            })
        })?;

        self.emit_event(EventPayload::RedeemMatched {
            redeem_id: outcome.redeem_id.clone(),
            asset: outcome.asset,
            amount: outcome.amount,
            custodians: outcome.custodians.len(),
            min_fee: outcome.min_fee,
        });
        Ok(outcome)
    }

    /// One matched custodian delivered the redeemed tokens on the external
    /// chain; its proportional collateral share unlocks. The request closes
    /// once its last custodian delivers.
    pub fn complete_redeem(
        &mut self,
        redeem_id: RedeemId,
        custodian: IncAddress,
    ) -> Result<UnlockOutcome, EngineError> {
        let outcome = self.transactional(|state, _params, _height| {
            let waiting = state
                .waiting_redeems
                .get(&redeem_id)
                .ok_or_else(|| EngineError::RedeemNotFound(redeem_id.clone()))?;
            let asset = waiting.asset;
            let matched_amount = waiting
                .custodian_entry(&custodian)
                .ok_or_else(|| EngineError::CustodianNotMatched(custodian.clone()))?
                .amount;

            // the in-flight total still includes this request, by design
            let unlocked = unlock_amount(state, &custodian, asset, matched_amount)?;

            state
                .custodians
                .get_mut(&custodian)
                .ok_or_else(|| EngineError::CustodianNotFound(custodian.clone()))?
                .unlock_collateral(asset, unlocked)?;

            let waiting = state
                .waiting_redeems
                .get_mut(&redeem_id)
                .ok_or_else(|| EngineError::RedeemNotFound(redeem_id.clone()))?;
            waiting.remove_custodian(&custodian);
            let request_closed = waiting.custodians.is_empty();
            if request_closed {
                state.waiting_redeems.remove(&redeem_id);
            }

            Ok(UnlockOutcome {
                redeem_id: redeem_id.clone(),
                custodian: custodian.clone(),
                unlocked,
                request_closed,
            })
        })?;

        self.emit_event(EventPayload::RedeemCompleted {
            redeem_id: outcome.redeem_id.clone(),
            custodian: outcome.custodian.clone(),
            unlocked: outcome.unlocked,
            request_closed: outcome.request_closed,
        });
        Ok(outcome)
    }
}
