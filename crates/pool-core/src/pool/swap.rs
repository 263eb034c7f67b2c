//! Swap pricing on the constant-product curve.
//!
//! `reserve_out_after = k / (reserve_in + amount_in)`, rounded up, so the
//! output is truncated toward zero and the reserve product never decreases.
//! Price impact is the only cost; swaps carry no fee.

use crate::errors::{PoolError, PoolResult};
use crate::ledger::AssetLedger;
use crate::math::{Fixed18, Rounding};
use crate::types::{ParticipantId, PoolEvent, SwapDirection};

use super::Pool;

impl<L: AssetLedger> Pool<L> {
    /// Output a swap of `amount_in` would receive at current reserves
    pub fn quote(&self, direction: SwapDirection, amount_in: Fixed18) -> PoolResult<Fixed18> {
        if amount_in.is_zero() {
            return Err(PoolError::InvalidAmount);
        }
        let reserves = self.state.reserves;
        if !reserves.is_funded() {
            return Err(PoolError::EmptyPool);
        }

        let reserve_in = reserves.get(direction.input());
        let reserve_out = reserves.get(direction.output());
        let reserve_in_after = reserve_in.checked_add(amount_in)?;
        let reserve_out_after = Fixed18::divide_wide(self.state.invariant, reserve_in_after, Rounding::Up)?;
        let amount_out = reserve_out
            .checked_sub(reserve_out_after)
            .map_err(|_| PoolError::SwapExceedsPool)?;

        if amount_out >= reserve_out {
            return Err(PoolError::SwapExceedsPool);
        }
        if amount_out.is_zero() {
            return Err(PoolError::InsufficientOutputAmount);
        }

        tracing::debug!(
            ?direction,
            amount_in = %amount_in,
            amount_out = %amount_out,
            "swap quote"
        );
        Ok(amount_out)
    }

    pub fn quote_a_for_b(&self, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.quote(SwapDirection::AForB, amount_in)
    }

    pub fn quote_b_for_a(&self, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.quote(SwapDirection::BForA, amount_in)
    }

    /// Pay `amount_in` of the input asset, receive the quoted output.
    /// On any failure no reserve, share or accumulator field changes.
    pub fn swap(
        &mut self,
        caller: &ParticipantId,
        direction: SwapDirection,
        amount_in: Fixed18,
    ) -> PoolResult<Fixed18> {
        self.atomically(|pool| {
            let amount_out = pool.quote(direction, amount_in)?;
            let input = direction.input();
            let output = direction.output();

            pool.ledger_mut(input).transfer_into(caller, amount_in)?;

            let timestamp = pool.accrue()?;
            let mut reserves = pool.state.reserves;
            *reserves.get_mut(input) = reserves.get(input).checked_add(amount_in)?;
            *reserves.get_mut(output) = reserves.get(output).checked_sub(amount_out)?;
            // k is refreshed from the new reserves, absorbing truncation drift
            pool.set_reserves(reserves);

            pool.ledger_mut(output).transfer_out(caller, amount_out)?;

            let asset_in = pool.ledger(input).asset().clone();
            let asset_out = pool.ledger(output).asset().clone();
            tracing::info!(
                participant = %caller,
                asset_in = %asset_in,
                asset_out = %asset_out,
                amount_in = %amount_in,
                amount_out = %amount_out,
                "swap"
            );
            pool.record(PoolEvent::Swap {
                participant: caller.clone(),
                asset_in,
                asset_out,
                amount_in,
                amount_out,
                reserves,
                timestamp,
            });
            Ok(amount_out)
        })
    }

    pub fn swap_a_for_b(&mut self, caller: &ParticipantId, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.swap(caller, SwapDirection::AForB, amount_in)
    }

    pub fn swap_b_for_a(&mut self, caller: &ParticipantId, amount_in: Fixed18) -> PoolResult<Fixed18> {
        self.swap(caller, SwapDirection::BForA, amount_in)
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::config::PoolConfig;
    use crate::errors::PoolError;
    use crate::ledger::{AssetLedger, TokenLedger};
    use crate::math::{Fixed18, Rounding};
    use crate::pool::Pool;
    use crate::types::{ParticipantId, Side, SwapDirection};

    fn units(n: u64) -> Fixed18 {
        Fixed18::from_units(n)
    }

    fn pool_with_liquidity(a: u64, b: u64) -> (Pool<TokenLedger>, ParticipantId) {
        let lp = ParticipantId::from("lp");
        let trader = ParticipantId::from("trader");
        let mut ledger_a = TokenLedger::new("AAA");
        let mut ledger_b = TokenLedger::new("BBB");
        for id in [&lp, &trader] {
            ledger_a.mint(id, units(10_000_000)).unwrap();
            ledger_b.mint(id, units(10_000_000)).unwrap();
            ledger_a.approve(id, units(10_000_000));
            ledger_b.approve(id, units(10_000_000));
        }
        let mut pool = Pool::with_clock(PoolConfig::default(), ledger_a, ledger_b, ManualClock::new(0)).unwrap();
        pool.deposit(&lp, units(a), units(b)).unwrap();
        (pool, trader)
    }

    #[test]
    fn test_quote_matches_curve() {
        let (pool, _) = pool_with_liquidity(1_000, 1_000);
        // 1000 - 1_000_000 / 1100 = 90.909090909090909090..., truncated
        let out = pool.quote_a_for_b(units(100)).unwrap();
        assert_eq!(out.to_string(), "90.90909090909090909");
        assert_eq!(pool.quote_b_for_a(units(100)).unwrap(), out);
    }

    #[test]
    fn test_swap_moves_reserves() {
        let (mut pool, trader) = pool_with_liquidity(1_000, 1_000);
        let before = pool.reserves();
        let out = pool.swap(&trader, SwapDirection::AForB, units(100)).unwrap();

        let after = pool.reserves();
        assert_eq!(after.a, before.a.checked_add(units(100)).unwrap());
        assert_eq!(after.b, before.b.checked_sub(out).unwrap());
        assert!(after.a.wide_product(after.b) >= before.a.wide_product(before.b));
        assert_eq!(pool.ledger(Side::B).balance_of(&trader), units(10_000_000).checked_add(out).unwrap());
        assert!(pool.is_consistent());
    }

    #[test]
    fn test_quote_errors() {
        let (pool, _) = pool_with_liquidity(1_000, 1_000);
        assert_eq!(pool.quote_a_for_b(Fixed18::ZERO), Err(PoolError::InvalidAmount));
        // Output below one raw unit
        assert_eq!(
            pool.quote_a_for_b(Fixed18::from_raw(1)),
            Err(PoolError::InsufficientOutputAmount)
        );
    }

    #[test]
    fn test_huge_input_never_empties_output_reserve() {
        let (pool, _) = pool_with_liquidity(1_000, 1_000);
        let reserve_b = pool.reserves().b;

        // k / (reserve_a + amount_in) is rounded up, so at least one raw unit stays
        let amount_in = Fixed18::from_units(u64::MAX);
        let out = pool.quote_a_for_b(amount_in).unwrap();
        let left = reserve_b.checked_sub(out).unwrap();
        assert!(left >= Fixed18::from_raw(1));
        assert_eq!(
            left,
            Fixed18::divide_wide(
                pool.invariant(),
                pool.reserves().a.checked_add(amount_in).unwrap(),
                Rounding::Up
            )
            .unwrap()
        );

        assert_eq!(pool.quote_a_for_b(Fixed18::MAX), Err(PoolError::MathOverflow));
    }

    #[test]
    fn test_quote_empty_pool() {
        let pool = Pool::new(PoolConfig::default(), TokenLedger::new("AAA"), TokenLedger::new("BBB")).unwrap();
        assert_eq!(pool.quote_a_for_b(units(1)), Err(PoolError::EmptyPool));
    }

    #[test]
    fn test_failed_transfer_leaves_state() {
        let (mut pool, _) = pool_with_liquidity(1_000, 1_000);
        let stranger = ParticipantId::from("stranger");
        let reserves = pool.reserves();
        let acc = pool.accumulator();

        let err = pool.swap_a_for_b(&stranger, units(10)).unwrap_err();
        assert!(matches!(err, PoolError::TransferRejected(_)));
        assert_eq!(pool.reserves(), reserves);
        assert_eq!(pool.accumulator(), acc);
    }
}
