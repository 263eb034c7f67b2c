//! # Flash Borrowing
//!
//! Protocol for one flash borrow:
//!
//! 1. Resolve the requested asset to a pool side (`UnsupportedAsset` otherwise)
//! 2. Quote `fee = amount * flash_fee_bps / 10_000`
//! 3. Disburse `amount` without touching the recorded reserve
//! 4. Run the borrower callback with the pool itself, so it may re-enter
//! 5. Require custody to equal the pre-disbursement balance plus `fee`, exactly,
//!    and the other asset's custody to still cover its reserve
//! 6. Credit `fee` to the reserve and refresh `k`
//!
//! The callback gets no raw access to the custodied ledgers. It returns funds
//! through [`Pool::repay`], which only moves value into custody and only while
//! a loan of that asset is out. Only the ending balance matters, so whatever
//! the callback does in between (swaps on this pool included) is accepted as
//! long as step 5 holds. Nested operations that move the
//! borrowed asset's reserve move the target of step 5 by the same amount;
//! value paid into a nested swap is booked there and cannot count as
//! repayment too. Any failure rolls back every nested effect of the
//! callback as well.

use crate::errors::{PoolError, PoolResult};
use crate::ledger::AssetLedger;
use crate::math::Fixed18;
use crate::types::{AssetId, ParticipantId, PoolEvent, Side};

use super::Pool;

/// Terms of an outstanding flash borrow, handed to the callback
#[derive(Debug, Clone, Copy)]
pub struct FlashLoan<'a> {
    pub borrower: &'a ParticipantId,
    pub asset: &'a AssetId,
    pub amount: Fixed18,
    pub fee: Fixed18,
    /// Opaque caller-supplied data
    pub payload: &'a [u8],
}

impl FlashLoan<'_> {
    /// Amount the pool's custody must grow back by
    pub fn repayment(&self) -> PoolResult<Fixed18> {
        self.amount.checked_add(self.fee)
    }
}

/// Code run while a flash borrow is outstanding
pub trait FlashBorrower<L: AssetLedger> {
    /// Use the funds and return `amount + fee` to pool custody before returning
    fn on_flash_borrow(&mut self, pool: &mut Pool<L>, loan: &FlashLoan<'_>) -> PoolResult<()>;
}

impl<L, F> FlashBorrower<L> for F
where
    L: AssetLedger,
    F: FnMut(&mut Pool<L>, &FlashLoan<'_>) -> PoolResult<()>,
{
    fn on_flash_borrow(&mut self, pool: &mut Pool<L>, loan: &FlashLoan<'_>) -> PoolResult<()> {
        self(pool, loan)
    }
}

impl<L: AssetLedger> Pool<L> {
    /// Lend `amount` of `asset` to `borrower` for the duration of `callback`.
    /// Returns the fee collected.
    pub fn flash_borrow<B>(
        &mut self,
        borrower: &ParticipantId,
        asset: &AssetId,
        amount: Fixed18,
        payload: &[u8],
        callback: &mut B,
    ) -> PoolResult<Fixed18>
    where
        B: FlashBorrower<L> + ?Sized,
    {
        let side = self.side_of(asset)?;
        if amount.is_zero() {
            return Err(PoolError::InvalidAmount);
        }
        let fee = self.flash_fee(amount)?;

        self.atomically(|pool| {
            let balance_before = pool.ledger(side).custody_balance();
            let reserve_before = pool.state.reserves.get(side);
            pool.lend(side, amount)?;
            pool.ledger_mut(side).transfer_out(borrower, amount)?;

            tracing::debug!(
                borrower = %borrower,
                asset = %asset,
                amount = %amount,
                fee = %fee,
                "flash borrow disbursed"
            );
            let loan = FlashLoan {
                borrower,
                asset,
                amount,
                fee,
                payload,
            };
            callback.on_flash_borrow(pool, &loan)?;
            *pool.state.lent.get_mut(side) = pool.state.lent.get(side).checked_sub(amount)?;

            let reserve_after = pool.state.reserves.get(side);
            let expected = if reserve_after >= reserve_before {
                balance_before
                    .checked_add(fee)?
                    .checked_add(reserve_after.checked_sub(reserve_before)?)?
            } else {
                balance_before
                    .checked_add(fee)?
                    .checked_sub(reserve_before.checked_sub(reserve_after)?)?
            };
            let actual = pool.ledger(side).custody_balance();
            if actual != expected {
                tracing::warn!(
                    borrower = %borrower,
                    asset = %asset,
                    expected = %expected,
                    actual = %actual,
                    "flash borrow repayment rejected"
                );
                return Err(PoolError::RepaymentShortfall { expected, actual });
            }
            let other = side.opposite();
            let reserve_other = pool.state.reserves.get(other);
            let custody_other = pool.ledger(other).custody_balance();
            if custody_other < reserve_other {
                tracing::warn!(
                    borrower = %borrower,
                    asset = %pool.ledger(other).asset(),
                    reserve = %reserve_other,
                    custody = %custody_other,
                    "flash borrow left custody below reserve"
                );
                return Err(PoolError::InsufficientCustody {
                    requested: reserve_other,
                    held: custody_other,
                });
            }

            // A zero fee leaves the reserves untouched, so the accumulator stays put
            let timestamp = if fee.is_zero() {
                pool.clock.now()
            } else {
                pool.accrue()?
            };
            let mut reserves = pool.state.reserves;
            *reserves.get_mut(side) = reserves.get(side).checked_add(fee)?;
            pool.set_reserves(reserves);

            tracing::info!(
                borrower = %borrower,
                asset = %asset,
                amount = %amount,
                fee = %fee,
                "flash borrow settled"
            );
            pool.record(PoolEvent::FlashBorrow {
                participant: borrower.clone(),
                asset: asset.clone(),
                amount,
                fee,
                reserves,
                timestamp,
            });
            Ok(fee)
        })
    }

    /// Return funds for an outstanding flash borrow: pulls `amount` of the
    /// loan's asset from the borrower into custody. Fails with
    /// `NoOutstandingLoan` unless a borrow of that asset is inside its
    /// callback.
    pub fn repay(&mut self, loan: &FlashLoan<'_>, amount: Fixed18) -> PoolResult<()> {
        let side = self.side_of(loan.asset)?;
        if self.state.lent.get(side).is_zero() {
            return Err(PoolError::NoOutstandingLoan(loan.asset.to_string()));
        }
        if amount.is_zero() {
            return Err(PoolError::InvalidAmount);
        }
        self.ledger_mut(side).transfer_into(loan.borrower, amount)?;
        tracing::debug!(borrower = %loan.borrower, asset = %loan.asset, amount = %amount, "flash borrow repayment");
        Ok(())
    }

    fn lend(&mut self, side: Side, amount: Fixed18) -> PoolResult<()> {
        let lent = self.state.lent.get(side).checked_add(amount)?;
        *self.state.lent.get_mut(side) = lent;
        Ok(())
    }
}
