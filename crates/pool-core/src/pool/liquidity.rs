//! Deposits and withdrawals against the share ledger.

use crate::errors::{PoolError, PoolResult};
use crate::ledger::AssetLedger;
use crate::math::{Fixed18, Rounding};
use crate::types::{ParticipantId, PoolEvent, Reserves};

use super::Pool;

impl<L: AssetLedger> Pool<L> {
    /// Deposit both assets and receive pool shares.
    ///
    /// The first deposit into a pool without shares issues the configured
    /// bootstrap amount, whatever the quantities. Later deposits must claim
    /// the same share count from each asset at the current reserve ratio,
    /// with no tolerance, or fail with `UnbalancedDeposit`.
    pub fn deposit(
        &mut self,
        caller: &ParticipantId,
        amount_a: Fixed18,
        amount_b: Fixed18,
    ) -> PoolResult<Fixed18> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(PoolError::InvalidAmount);
        }

        self.atomically(|pool| {
            let issued = pool.shares_for_deposit(amount_a, amount_b)?;

            pool.ledger_a.transfer_into(caller, amount_a)?;
            pool.ledger_b.transfer_into(caller, amount_b)?;

            let timestamp = pool.accrue()?;
            let current = pool.state.reserves;
            let reserves = Reserves::new(
                current.a.checked_add(amount_a)?,
                current.b.checked_add(amount_b)?,
            );
            let held = pool.share_of(caller).checked_add(issued)?;
            let total = pool.state.total_shares.checked_add(issued)?;

            pool.set_reserves(reserves);
            pool.set_shares(caller, held);
            pool.state.total_shares = total;

            tracing::info!(
                participant = %caller,
                amount_a = %amount_a,
                amount_b = %amount_b,
                shares = %issued,
                "deposit"
            );
            pool.record(PoolEvent::Deposit {
                participant: caller.clone(),
                amount_a,
                amount_b,
                shares_issued: issued,
                reserves,
                timestamp,
            });
            Ok(issued)
        })
    }

    /// Burn `share_amount` of the caller's shares for a pro-rata slice of
    /// both reserves. The last outstanding shares cannot be withdrawn in one
    /// call: `share_amount` must stay strictly below the total.
    pub fn withdraw(
        &mut self,
        caller: &ParticipantId,
        share_amount: Fixed18,
    ) -> PoolResult<(Fixed18, Fixed18)> {
        if share_amount.is_zero() {
            return Err(PoolError::InvalidAmount);
        }

        self.atomically(|pool| {
            let held = pool.share_of(caller);
            if share_amount > held {
                return Err(PoolError::InsufficientShares {
                    requested: share_amount,
                    held,
                });
            }
            let total = pool.state.total_shares;
            if share_amount >= total {
                return Err(PoolError::ExceedsTotalShares {
                    requested: share_amount,
                    total,
                });
            }

            let (amount_a, amount_b) = pool.quote_withdraw(share_amount)?;

            let timestamp = pool.accrue()?;
            let current = pool.state.reserves;
            let reserves = Reserves::new(
                current.a.checked_sub(amount_a)?,
                current.b.checked_sub(amount_b)?,
            );
            pool.set_shares(caller, held.checked_sub(share_amount)?);
            pool.state.total_shares = total.checked_sub(share_amount)?;
            pool.set_reserves(reserves);

            pool.ledger_a.transfer_out(caller, amount_a)?;
            pool.ledger_b.transfer_out(caller, amount_b)?;

            tracing::info!(
                participant = %caller,
                shares = %share_amount,
                amount_a = %amount_a,
                amount_b = %amount_b,
                "withdrawal"
            );
            pool.record(PoolEvent::Withdrawal {
                participant: caller.clone(),
                shares_burned: share_amount,
                amount_a,
                amount_b,
                reserves,
                timestamp,
            });
            Ok((amount_a, amount_b))
        })
    }

    /// Assets `share_amount` shares redeem for at current reserves
    pub fn quote_withdraw(&self, share_amount: Fixed18) -> PoolResult<(Fixed18, Fixed18)> {
        let total = self.state.total_shares;
        if total.is_zero() {
            return Err(PoolError::EmptyPool);
        }
        let reserves = self.state.reserves;
        let amount_a = share_amount.mul_div(reserves.a, total, Rounding::Down)?;
        let amount_b = share_amount.mul_div(reserves.b, total, Rounding::Down)?;
        Ok((amount_a, amount_b))
    }

    fn shares_for_deposit(&self, amount_a: Fixed18, amount_b: Fixed18) -> PoolResult<Fixed18> {
        let total = self.state.total_shares;
        if total.is_zero() {
            return Ok(self.config.bootstrap_shares);
        }

        let reserves = self.state.reserves;
        let share_a = amount_a.mul_div(total, reserves.a, Rounding::Down)?;
        let share_b = amount_b.mul_div(total, reserves.b, Rounding::Down)?;
        tracing::debug!(share_a = %share_a, share_b = %share_b, "deposit share claims");

        if share_a != share_b {
            return Err(PoolError::UnbalancedDeposit);
        }
        if share_a.is_zero() {
            return Err(PoolError::InvalidAmount);
        }
        Ok(share_a)
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::config::PoolConfig;
    use crate::errors::PoolError;
    use crate::ledger::{AssetLedger, TokenLedger};
    use crate::math::Fixed18;
    use crate::pool::Pool;
    use crate::types::{ParticipantId, Side};

    fn units(n: u64) -> Fixed18 {
        Fixed18::from_units(n)
    }

    fn funded_pool(who: &[&str]) -> Pool<TokenLedger> {
        let mut a = TokenLedger::new("AAA");
        let mut b = TokenLedger::new("BBB");
        for name in who {
            let id = ParticipantId::from(*name);
            a.mint(&id, units(1_000_000)).unwrap();
            b.mint(&id, units(1_000_000)).unwrap();
            a.approve(&id, units(1_000_000));
            b.approve(&id, units(1_000_000));
        }
        Pool::with_clock(PoolConfig::default(), a, b, ManualClock::new(0)).unwrap()
    }

    #[test]
    fn test_bootstrap_ignores_quantities() {
        let alice = ParticipantId::from("alice");
        let mut pool = funded_pool(&["alice"]);
        let shares = pool.deposit(&alice, units(3), units(700)).unwrap();
        assert_eq!(shares, units(100));
        assert_eq!(pool.share_of(&alice), units(100));
        assert_eq!(pool.ledger(Side::A).custody_balance(), units(3));
        assert_eq!(pool.ledger(Side::B).custody_balance(), units(700));
    }

    #[test]
    fn test_unbalanced_deposit_rolls_back() {
        let alice = ParticipantId::from("alice");
        let bob = ParticipantId::from("bob");
        let mut pool = funded_pool(&["alice", "bob"]);
        pool.deposit(&alice, units(100), units(200)).unwrap();

        let err = pool.deposit(&bob, units(10), units(10)).unwrap_err();
        assert_eq!(err, PoolError::UnbalancedDeposit);
        assert_eq!(pool.share_of(&bob), Fixed18::ZERO);
        assert_eq!(pool.ledger(Side::A).balance_of(&bob), units(1_000_000));

        assert_eq!(pool.deposit(&bob, units(10), units(20)).unwrap(), units(10));
    }

    #[test]
    fn test_failed_second_transfer_restores_first() {
        let alice = ParticipantId::from("alice");
        let mut pool = funded_pool(&["alice"]);
        pool.ledger_mut(Side::B).approve(&alice, units(1));

        let err = pool.deposit(&alice, units(5), units(5)).unwrap_err();
        assert!(matches!(err, PoolError::TransferRejected(_)));
        assert_eq!(pool.ledger(Side::A).custody_balance(), Fixed18::ZERO);
        assert_eq!(pool.ledger(Side::A).balance_of(&alice), units(1_000_000));
        assert_eq!(pool.total_shares(), Fixed18::ZERO);
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let alice = ParticipantId::from("alice");
        let mut pool = funded_pool(&["alice"]);
        assert_eq!(pool.deposit(&alice, Fixed18::ZERO, units(1)), Err(PoolError::InvalidAmount));
        assert_eq!(pool.withdraw(&alice, Fixed18::ZERO), Err(PoolError::InvalidAmount));
    }

    #[test]
    fn test_withdraw_share_checks() {
        let alice = ParticipantId::from("alice");
        let bob = ParticipantId::from("bob");
        let mut pool = funded_pool(&["alice", "bob"]);
        pool.deposit(&alice, units(100), units(100)).unwrap();

        assert_eq!(
            pool.withdraw(&bob, units(1)),
            Err(PoolError::InsufficientShares { requested: units(1), held: Fixed18::ZERO })
        );
        assert_eq!(
            pool.withdraw(&alice, units(100)),
            Err(PoolError::ExceedsTotalShares { requested: units(100), total: units(100) })
        );

        let (a, b) = pool.withdraw(&alice, units(25)).unwrap();
        assert_eq!((a, b), (units(25), units(25)));
        assert_eq!(pool.total_shares(), units(75));
        assert_eq!(pool.ledger(Side::A).balance_of(&alice), units(1_000_000 - 75));
        assert!(pool.is_consistent());
    }
}
