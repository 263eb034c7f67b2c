//! # Asset Ledger Collaborator
//!
//! The pool does not own balances; it custodies them on a transferable-value
//! service per asset. [`AssetLedger`] is the seam, [`TokenLedger`] an
//! in-memory balance/allowance token implementing it.

use std::collections::BTreeMap;

use crate::errors::{PoolError, PoolResult};
use crate::math::Fixed18;
use crate::types::{AssetId, ParticipantId};

/// Transferable-value service for one asset, seen from the pool
pub trait AssetLedger {
    /// Opaque state capture used to roll back a failed operation
    type Snapshot;

    fn asset(&self) -> &AssetId;

    /// Amount of the asset currently held by the pool
    fn custody_balance(&self) -> Fixed18;

    fn balance_of(&self, holder: &ParticipantId) -> Fixed18;

    /// Pull `amount` from `from` into pool custody.
    /// Fails with `TransferRejected` without authorization or balance.
    fn transfer_into(&mut self, from: &ParticipantId, amount: Fixed18) -> PoolResult<()>;

    /// Push `amount` from pool custody to `to`.
    /// Fails with `InsufficientCustody` if the pool holds less.
    fn transfer_out(&mut self, to: &ParticipantId, amount: Fixed18) -> PoolResult<()>;

    fn snapshot(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: Self::Snapshot);
}

/// In-memory fungible token with a single spender: the pool
#[derive(Debug, Clone)]
pub struct TokenLedger {
    asset: AssetId,
    balances: BTreeMap<ParticipantId, Fixed18>,
    allowances: BTreeMap<ParticipantId, Fixed18>,
    custody: Fixed18,
}

impl TokenLedger {
    pub fn new(asset: impl Into<AssetId>) -> Self {
        Self {
            asset: asset.into(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            custody: Fixed18::ZERO,
        }
    }

    /// Credit new units to `to`
    pub fn mint(&mut self, to: &ParticipantId, amount: Fixed18) -> PoolResult<()> {
        let balance = self.balance_of(to).checked_add(amount)?;
        self.set_balance(to, balance);
        Ok(())
    }

    /// Authorize the pool to pull up to `amount` from `owner`
    pub fn approve(&mut self, owner: &ParticipantId, amount: Fixed18) {
        if amount.is_zero() {
            self.allowances.remove(owner);
        } else {
            self.allowances.insert(owner.clone(), amount);
        }
    }

    pub fn allowance(&self, owner: &ParticipantId) -> Fixed18 {
        self.allowances.get(owner).copied().unwrap_or_default()
    }

    fn debit(&self, from: &ParticipantId, amount: Fixed18) -> PoolResult<Fixed18> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(PoolError::transfer_rejected(format!(
                "{} holds {} {}, needs {}",
                from, balance, self.asset, amount
            )));
        }
        balance.checked_sub(amount)
    }

    fn set_balance(&mut self, holder: &ParticipantId, balance: Fixed18) {
        if balance.is_zero() {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.clone(), balance);
        }
    }
}

impl AssetLedger for TokenLedger {
    type Snapshot = TokenLedger;

    fn asset(&self) -> &AssetId {
        &self.asset
    }

    fn custody_balance(&self) -> Fixed18 {
        self.custody
    }

    fn balance_of(&self, holder: &ParticipantId) -> Fixed18 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn transfer_into(&mut self, from: &ParticipantId, amount: Fixed18) -> PoolResult<()> {
        let allowance = self.allowance(from);
        if allowance < amount {
            return Err(PoolError::transfer_rejected(format!(
                "{} authorized {} {}, needs {}",
                from, allowance, self.asset, amount
            )));
        }
        let balance = self.debit(from, amount)?;
        let custody = self.custody.checked_add(amount)?;

        self.set_balance(from, balance);
        self.approve(from, allowance.checked_sub(amount)?);
        self.custody = custody;
        Ok(())
    }

    fn transfer_out(&mut self, to: &ParticipantId, amount: Fixed18) -> PoolResult<()> {
        if self.custody < amount {
            return Err(PoolError::InsufficientCustody {
                requested: amount,
                held: self.custody,
            });
        }
        let balance = self.balance_of(to).checked_add(amount)?;
        self.custody = self.custody.checked_sub(amount)?;
        self.set_balance(to, balance);
        Ok(())
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}
