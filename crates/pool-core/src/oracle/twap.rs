//! # TWAP (Time-Weighted Average Price) Accumulator
//!
//! Each reserve change first integrates the price that prevailed since the
//! previous change: `cumulative += price * elapsed`. Prices are taken from
//! the reserves *before* the mutation. Several operations within the same
//! second add nothing, so moving the price inside one instant cannot move
//! the accumulator.
//!
//! Consumers sample [`AccumulatorSnapshot`]s at two times and divide the
//! difference by the elapsed time, see [`average_price`].

use ethnum::U256;

use crate::constants::SCALE;
use crate::errors::{PoolError, PoolResult};
use crate::math::safe_math::{div_u256, narrow_u256, safe_add_u256, safe_sub_u256, wide_mul, Rounding};
use crate::math::Fixed18;
use crate::types::{Reserves, Side};

/// Point-in-time copy of the accumulator, safe to hand to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorSnapshot {
    /// Integral of the price of A quoted in B; 18 fractional digits
    pub cumulative_price_a: U256,
    /// Integral of the price of B quoted in A; 18 fractional digits
    pub cumulative_price_b: U256,
    pub timestamp: i64,
}

impl AccumulatorSnapshot {
    pub fn cumulative(&self, side: Side) -> U256 {
        match side {
            Side::A => self.cumulative_price_a,
            Side::B => self.cumulative_price_b,
        }
    }
}

/// Monotonic price integrals of both quote directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceAccumulator {
    cumulative_price_a: U256,
    cumulative_price_b: U256,
    last_timestamp: i64,
}

impl PriceAccumulator {
    /// Fresh accumulator anchored at `start`
    pub fn new(start: i64) -> Self {
        Self {
            cumulative_price_a: U256::ZERO,
            cumulative_price_b: U256::ZERO,
            last_timestamp: start,
        }
    }

    pub fn snapshot(&self) -> AccumulatorSnapshot {
        AccumulatorSnapshot {
            cumulative_price_a: self.cumulative_price_a,
            cumulative_price_b: self.cumulative_price_b,
            timestamp: self.last_timestamp,
        }
    }

    /// Integrate the prices implied by `reserves` up to `now`.
    ///
    /// Returns whether the accumulator advanced. A clock reading at or before
    /// the last update counts as zero elapsed time. With either reserve at
    /// zero there is no price, so only the timestamp moves.
    pub fn update(&mut self, reserves: &Reserves, now: i64) -> PoolResult<bool> {
        if now <= self.last_timestamp {
            return Ok(false);
        }
        let seconds = elapsed_seconds(self.last_timestamp, now)?;
        let elapsed = U256::from(seconds as u128);

        if reserves.is_funded() {
            let price_a = spot_price_raw(reserves.b, reserves.a)?;
            let price_b = spot_price_raw(reserves.a, reserves.b)?;
            let next_a = safe_add_u256(self.cumulative_price_a, checked_mul_u256(price_a, elapsed)?)?;
            let next_b = safe_add_u256(self.cumulative_price_b, checked_mul_u256(price_b, elapsed)?)?;

            tracing::debug!(
                elapsed = seconds,
                price_a = %price_a,
                price_b = %price_b,
                "accumulating prices"
            );

            self.cumulative_price_a = next_a;
            self.cumulative_price_b = next_b;
        }

        self.last_timestamp = now;
        Ok(true)
    }
}

/// `numerator / denominator` at 18 digits, kept wide so extreme ratios do not overflow
fn spot_price_raw(numerator: Fixed18, denominator: Fixed18) -> PoolResult<U256> {
    div_u256(wide_mul(numerator.raw(), SCALE), U256::from(denominator.raw()), Rounding::Down)
}

/// `later - earlier` for `later > earlier`; a jump wider than `i64` is an overflow
fn elapsed_seconds(earlier: i64, later: i64) -> PoolResult<i64> {
    later.checked_sub(earlier).ok_or(PoolError::MathOverflow)
}

fn checked_mul_u256(a: U256, b: U256) -> PoolResult<U256> {
    a.checked_mul(b).ok_or(PoolError::MathOverflow)
}

/// Average price of `side` (quoted in the other asset) between two snapshots:
/// `(cumulative_at_t2 - cumulative_at_t1) / (t2 - t1)`
pub fn average_price(
    earlier: &AccumulatorSnapshot,
    later: &AccumulatorSnapshot,
    side: Side,
) -> PoolResult<Fixed18> {
    if later.timestamp <= earlier.timestamp {
        return Err(PoolError::DivisionByZero);
    }
    let delta = safe_sub_u256(later.cumulative(side), earlier.cumulative(side))?;
    let elapsed = U256::from(elapsed_seconds(earlier.timestamp, later.timestamp)? as u128);
    let average = div_u256(delta, elapsed, Rounding::Down)?;
    narrow_u256(average).map(Fixed18::from_raw)
}
