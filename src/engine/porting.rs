//! Custodian registration and the porting (mint) flow.

use super::core::{validated_rates, PortalEngine};
use super::results::{EngineError, PortingOutcome};
use crate::events::EventPayload;
use crate::fees::min_porting_fee;
use crate::porting::plan_porting_match;
use crate::rates::Converter;
use crate::requests::WaitingPorting;
use crate::custodian::Custodian;
use crate::types::{AssetId, IncAddress, PortingId, RemoteAddress};
use std::collections::BTreeMap;

impl PortalEngine {
    /// Registers a custodian, or merges a new pledge into an existing one.
    pub fn register_custodian(
        &mut self,
        inc_address: IncAddress,
        collateral: u64,
        remote_addresses: BTreeMap<AssetId, RemoteAddress>,
    ) -> Result<(), EngineError> {
        let (is_new, new_free) = self.transactional(|state, _params, _height| {
            if let Some(existing) = state.custodians.get_mut(&inc_address) {
                existing.deposit(collateral);
                existing.register_remote_addresses(remote_addresses.clone());
                Ok((false, existing.free_collateral))
            } else {
                let mut custodian = Custodian::new(inc_address.clone(), remote_addresses.clone());
                custodian.deposit(collateral);
                let free = custodian.free_collateral;
                state.custodians.insert(custodian);
                Ok((true, free))
            }
        })?;

        if is_new {
            self.emit_event(EventPayload::CustodianRegistered {
                inc_address,
                collateral,
            });
        } else {
            self.emit_event(EventPayload::CollateralDeposited {
                inc_address,
                amount: collateral,
                new_free,
            });
        }
        Ok(())
    }

    /// Adds collateral to an existing custodian, e.g. to leave a breached tier.
    pub fn top_up_custodian(
        &mut self,
        inc_address: IncAddress,
        amount: u64,
    ) -> Result<(), EngineError> {
        let new_free = self.transactional(|state, _params, _height| {
            let custodian = state
                .custodians
                .get_mut(&inc_address)
                .ok_or_else(|| EngineError::CustodianNotFound(inc_address.clone()))?;
            custodian.deposit(amount);
            Ok(custodian.free_collateral)
        })?;

        self.emit_event(EventPayload::CollateralDeposited {
            inc_address,
            amount,
            new_free,
        });
        Ok(())
    }

    /// Matches a new porting request against the pool and locks collateral.
    /// Fails whole: a pool that cannot cover the amount stays untouched.
    pub fn request_porting(
        &mut self,
        porting_id: PortingId,
        asset: AssetId,
        amount: u64,
    ) -> Result<PortingOutcome, EngineError> {
        let outcome = self.transactional(|state, params, height| {
            if state.waiting_portings.contains_key(&porting_id) {
                return Err(EngineError::DuplicatePorting(porting_id.clone()));
            }

            let table = validated_rates(state, params)?;
            let converter =
                Converter::new(&table, &params.supported_assets, params.collateral_asset);

            let plan = plan_porting_match(&state.custodians, &converter, asset, amount)?;
            let min_fee = min_porting_fee(&converter, asset, amount, params.porting_fee_bps)?;

            for entry in &plan {
                let custodian = state
                    .custodians
                    .get_mut(&entry.inc_address)
                    .ok_or_else(|| EngineError::CustodianNotFound(entry.inc_address.clone()))?;
                custodian.lock_collateral(asset, entry.locked_collateral)?;
                state
                    .locked_collateral
                    .add(&entry.inc_address, entry.locked_collateral);
            }

            let expiry_height = height + params.porting_expiry_window;
            state.waiting_portings.insert(
                porting_id.clone(),
                WaitingPorting {
                    porting_id: porting_id.clone(),
                    asset,
                    amount,
                    custodians: plan.clone(),
                    expiry_height,
                },
            );

            Ok(PortingOutcome {
                porting_id: porting_id.clone(),
                asset,
                amount,
                min_fee,
                expiry_height,
                custodians: plan,
            })
        })?;

        self.emit_event(EventPayload::PortingMatched {
            porting_id: outcome.porting_id.clone(),
            asset: outcome.asset,
            amount: outcome.amount,
            custodians: outcome.custodians.len(),
            min_fee: outcome.min_fee,
        });
        Ok(outcome)
    }

    /// The user finished minting: the matched custodians are now attested to
    /// hold the deposited tokens and become eligible for redemption matching.
    pub fn complete_mint(&mut self, porting_id: PortingId) -> Result<(), EngineError> {
        let (asset, amount) = self.transactional(|state, _params, _height| {
            let waiting = state
                .waiting_portings
                .remove(&porting_id)
                .ok_or_else(|| EngineError::PortingNotFound(porting_id.clone()))?;

            for matched in &waiting.custodians {
                let custodian = state
                    .custodians
                    .get_mut(&matched.inc_address)
                    .ok_or_else(|| EngineError::CustodianNotFound(matched.inc_address.clone()))?;
                custodian.credit_holding(waiting.asset, matched.amount);
            }
            Ok((waiting.asset, waiting.amount))
        })?;

        self.emit_event(EventPayload::MintCompleted {
            porting_id,
            asset,
            amount,
        });
        Ok(())
    }

    /// Expires every waiting porting past its window at the current height,
    /// releasing the collateral locked for it. Returns the expired ids.
    pub fn expire_portings(&mut self) -> Result<Vec<PortingId>, EngineError> {
        let expired = self.transactional(|state, _params, height| {
            let due: Vec<PortingId> = state
                .waiting_portings
                .values()
                .filter(|w| w.is_expired(height))
                .map(|w| w.porting_id.clone())
                .collect();

            let mut released = Vec::new();
            for porting_id in due {
                let waiting = state
                    .waiting_portings
                    .remove(&porting_id)
                    .ok_or_else(|| EngineError::PortingNotFound(porting_id.clone()))?;
                let mut unlocked = 0;
                for matched in &waiting.custodians {
                    let custodian = state.custodians.get_mut(&matched.inc_address).ok_or_else(
                        || EngineError::CustodianNotFound(matched.inc_address.clone()),
                    )?;
                    // mint never completed, so no holdings to release
                    custodian.release_expired_porting(
                        waiting.asset,
                        matched.locked_collateral,
                        0,
                    )?;
                    unlocked += matched.locked_collateral;
                }
                released.push((porting_id, waiting.asset, unlocked));
            }
            Ok(released)
        })?;

        let mut ids = Vec::with_capacity(expired.len());
        for (porting_id, asset, unlocked) in expired {
            self.emit_event(EventPayload::PortingExpired {
                porting_id: porting_id.clone(),
                asset,
                unlocked,
            });
            ids.push(porting_id);
        }
        Ok(ids)
    }
}
