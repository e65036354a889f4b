// 3.0: custodian records and the pool they form. every balance transition in
// the protocol funnels through the checked update methods here; a debit that
// would underflow fails before any field mutates.
//
// invariant after every operation:
//   free_collateral + sum(locked_collateral) <= total_collateral

use crate::types::{AssetId, IncAddress, RemoteAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum CustodianError {
    #[error("free collateral is less than the amount to lock")]
    InsufficientFreeCollateral,

    #[error("locked collateral is less than the amount to release")]
    InsufficientLockedCollateral,

    #[error("held public tokens are less than the amount to release")]
    InsufficientHolding,

    #[error("total collateral is less than the amount to seize")]
    InsufficientTotalCollateral,
}

/// One collateral-pledging party backing minted foreign-asset representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custodian {
    pub inc_address: IncAddress,
    pub remote_addresses: BTreeMap<AssetId, RemoteAddress>,
    pub total_collateral: u64,
    pub free_collateral: u64,
    pub locked_collateral: BTreeMap<AssetId, u64>,
    pub holding_pub_tokens: BTreeMap<AssetId, u64>,
}

impl Custodian {
    pub fn new(inc_address: IncAddress, remote_addresses: BTreeMap<AssetId, RemoteAddress>) -> Self {
        Self {
            inc_address,
            remote_addresses,
            total_collateral: 0,
            free_collateral: 0,
            locked_collateral: BTreeMap::new(),
            holding_pub_tokens: BTreeMap::new(),
        }
    }

    pub fn remote_address(&self, asset: AssetId) -> Option<&RemoteAddress> {
        self.remote_addresses.get(&asset)
    }

    pub fn locked(&self, asset: AssetId) -> u64 {
        self.locked_collateral.get(&asset).copied().unwrap_or(0)
    }

    pub fn holding(&self, asset: AssetId) -> u64 {
        self.holding_pub_tokens.get(&asset).copied().unwrap_or(0)
    }

    /// Pledges fresh collateral: both total and free grow.
    pub fn deposit(&mut self, amount: u64) {
        self.total_collateral = self.total_collateral.saturating_add(amount);
        self.free_collateral = self.free_collateral.saturating_add(amount);
    }

    /// Registers remote addresses for assets not yet covered. The first
    /// registration per asset wins; later ones are ignored.
    pub fn register_remote_addresses(&mut self, addresses: BTreeMap<AssetId, RemoteAddress>) {
        for (asset, addr) in addresses {
            self.remote_addresses.entry(asset).or_insert(addr);
        }
    }

    /// Earmarks free collateral against minted exposure for `asset`.
    /// Holdings are not touched here: the custodian must not match redeem
    /// requests before the user actually completes the mint.
    pub fn lock_collateral(&mut self, asset: AssetId, amount: u64) -> Result<(), CustodianError> {
        let free = self
            .free_collateral
            .checked_sub(amount)
            .ok_or(CustodianError::InsufficientFreeCollateral)?;
        self.free_collateral = free;
        *self.locked_collateral.entry(asset).or_insert(0) += amount;
        Ok(())
    }

    /// Records public tokens the custodian now holds on behalf of users,
    /// called once the user completes the mint.
    pub fn credit_holding(&mut self, asset: AssetId, amount: u64) {
        *self.holding_pub_tokens.entry(asset).or_insert(0) += amount;
    }

    /// Releases held public tokens when a redeem request is matched against
    /// this custodian. The matched amount lives on in the waiting request.
    pub fn debit_holding(&mut self, asset: AssetId, amount: u64) -> Result<(), CustodianError> {
        let held = self.holding(asset);
        let rest = held
            .checked_sub(amount)
            .ok_or(CustodianError::InsufficientHolding)?;
        self.holding_pub_tokens.insert(asset, rest);
        Ok(())
    }

    /// Moves collateral from locked back to free when the custodian returned
    /// the redeemed tokens to the user.
    pub fn unlock_collateral(&mut self, asset: AssetId, amount: u64) -> Result<(), CustodianError> {
        let locked = self.locked(asset);
        let rest = locked
            .checked_sub(amount)
            .ok_or(CustodianError::InsufficientLockedCollateral)?;
        self.locked_collateral.insert(asset, rest);
        self.free_collateral += amount;
        Ok(())
    }

    /// Seizes `seized` collateral from the locked balance (it leaves the
    /// custodian entirely) and returns `returned` to the free balance.
    pub fn apply_liquidation(
        &mut self,
        asset: AssetId,
        seized: u64,
        returned: u64,
    ) -> Result<(), CustodianError> {
        let total = self
            .total_collateral
            .checked_sub(seized)
            .ok_or(CustodianError::InsufficientTotalCollateral)?;
        let debit = seized
            .checked_add(returned)
            .ok_or(CustodianError::InsufficientLockedCollateral)?;
        let locked = self
            .locked(asset)
            .checked_sub(debit)
            .ok_or(CustodianError::InsufficientLockedCollateral)?;

        self.total_collateral = total;
        self.locked_collateral.insert(asset, locked);
        self.free_collateral += returned;
        Ok(())
    }

    /// Unwinds an expired porting request: collateral unlocks and any holdings
    /// credited for it are released.
    pub fn release_expired_porting(
        &mut self,
        asset: AssetId,
        unlocked: u64,
        unheld: u64,
    ) -> Result<(), CustodianError> {
        let locked = self
            .locked(asset)
            .checked_sub(unlocked)
            .ok_or(CustodianError::InsufficientLockedCollateral)?;
        let held = self
            .holding(asset)
            .checked_sub(unheld)
            .ok_or(CustodianError::InsufficientHolding)?;

        self.locked_collateral.insert(asset, locked);
        self.holding_pub_tokens.insert(asset, held);
        self.free_collateral += unlocked;
        Ok(())
    }

    pub fn total_locked(&self) -> u64 {
        self.locked_collateral.values().sum()
    }
}

/// The mutable collection of custodian records, keyed by portal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodianPool {
    custodians: BTreeMap<IncAddress, Custodian>,
}

impl CustodianPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<&Custodian> {
        self.custodians.get(address)
    }

    pub fn get_mut(&mut self, address: &str) -> Option<&mut Custodian> {
        self.custodians.get_mut(address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.custodians.contains_key(address)
    }

    pub fn insert(&mut self, custodian: Custodian) {
        self.custodians.insert(custodian.inc_address.clone(), custodian);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IncAddress, &Custodian)> {
        self.custodians.iter()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &IncAddress> {
        self.custodians.keys()
    }

    pub fn len(&self) -> usize {
        self.custodians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custodians.is_empty()
    }
}
