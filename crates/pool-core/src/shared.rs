//! Thread-safe pool handle.
//!
//! One mutex guards the whole pool (reserves, shares, accumulator and the
//! custodied ledgers). It is held for a complete operation, flash-borrow
//! callback included. The callback receives `&mut Pool` and re-enters the
//! pool through it instead of through this handle.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{PoolError, PoolResult};
use crate::ledger::AssetLedger;
use crate::math::Fixed18;
use crate::oracle::AccumulatorSnapshot;
use crate::pool::{FlashBorrower, Pool};
use crate::types::{AssetId, ParticipantId, Reserves, SwapDirection};

/// Cloneable handle to a pool shared between threads
pub struct SharedPool<L: AssetLedger> {
    inner: Arc<Mutex<Pool<L>>>,
}

impl<L: AssetLedger> Clone for SharedPool<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: AssetLedger> SharedPool<L> {
    pub fn new(pool: Pool<L>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    fn lock(&self) -> PoolResult<MutexGuard<'_, Pool<L>>> {
        self.inner.lock().map_err(|_| PoolError::LockPoisoned)
    }

    /// Run `op` with exclusive access to the pool
    pub fn with<T>(&self, op: impl FnOnce(&mut Pool<L>) -> PoolResult<T>) -> PoolResult<T> {
        let mut pool = self.lock()?;
        op(&mut pool)
    }

    pub fn deposit(&self, caller: &ParticipantId, amount_a: Fixed18, amount_b: Fixed18) -> PoolResult<Fixed18> {
        self.with(|pool| pool.deposit(caller, amount_a, amount_b))
    }

    pub fn withdraw(&self, caller: &ParticipantId, share_amount: Fixed18) -> PoolResult<(Fixed18, Fixed18)> {
        self.with(|pool| pool.withdraw(caller, share_amount))
    }

    pub fn swap(&self, caller: &ParticipantId, direction: SwapDirection, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.with(|pool| pool.swap(caller, direction, amount_in))
    }

    pub fn flash_borrow<B>(
        &self,
        borrower: &ParticipantId,
        asset: &AssetId,
        amount: Fixed18,
        payload: &[u8],
        callback: &mut B,
    ) -> PoolResult<Fixed18>
    where
        B: FlashBorrower<L> + ?Sized,
    {
        self.with(|pool| pool.flash_borrow(borrower, asset, amount, payload, callback))
    }

    pub fn quote(&self, direction: SwapDirection, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.with(|pool| pool.quote(direction, amount_in))
    }

    pub fn reserves(&self) -> PoolResult<Reserves> {
        self.with(|pool| Ok(pool.reserves()))
    }

    pub fn total_shares(&self) -> PoolResult<Fixed18> {
        self.with(|pool| Ok(pool.total_shares()))
    }

    pub fn share_of(&self, participant: &ParticipantId) -> PoolResult<Fixed18> {
        self.with(|pool| Ok(pool.share_of(participant)))
    }

    pub fn accumulator(&self) -> PoolResult<AccumulatorSnapshot> {
        self.with(|pool| Ok(pool.accumulator()))
    }
}
