//! # Safe Math Operations
//!
//! Overflow-checked arithmetic on raw integers. Products of two `u128`
//! values are formed in 256 bits so that `a * b / c` never overflows before
//! the division.

use ethnum::U256;

use crate::errors::{PoolError, PoolResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// Macro to generate safe arithmetic functions
macro_rules! safe_arith {
    // Binary operations with checked methods
    ($fn_name:ident, $type:ty, $checked_method:ident, $error:expr) => {
        /// Checked binary operation
        pub fn $fn_name(a: $type, b: $type) -> PoolResult<$type> {
            a.$checked_method(b).ok_or($error)
        }
    };
}

safe_arith!(safe_add_u128, u128, checked_add, PoolError::MathOverflow);
safe_arith!(safe_sub_u128, u128, checked_sub, PoolError::MathUnderflow);
safe_arith!(safe_mul_u128, u128, checked_mul, PoolError::MathOverflow);

safe_arith!(safe_add_u256, U256, checked_add, PoolError::MathOverflow);
safe_arith!(safe_sub_u256, U256, checked_sub, PoolError::MathUnderflow);

/// Full 256-bit product of two `u128` values
pub fn wide_mul(a: u128, b: u128) -> U256 {
    // 128 x 128 bits always fits in 256 bits
    U256::from(a) * U256::from(b)
}

/// Narrow a 256-bit value back to `u128`
pub fn narrow_u256(value: U256) -> PoolResult<u128> {
    let (hi, lo) = value.into_words();
    if hi != 0 {
        return Err(PoolError::MathOverflow);
    }
    Ok(lo)
}

/// Divide a 256-bit numerator by a 256-bit denominator with explicit rounding
pub fn div_u256(numerator: U256, denominator: U256, rounding: Rounding) -> PoolResult<U256> {
    if denominator == U256::ZERO {
        return Err(PoolError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    match rounding {
        Rounding::Down => Ok(quotient),
        Rounding::Up => {
            if numerator % denominator == U256::ZERO {
                Ok(quotient)
            } else {
                safe_add_u256(quotient, U256::ONE)
            }
        }
    }
}

/// Mul-div operation with u128 using U256 intermediate
pub fn safe_mul_div_u128(a: u128, b: u128, c: u128, rounding: Rounding) -> PoolResult<u128> {
    let result = div_u256(wide_mul(a, b), U256::from(c), rounding)?;
    narrow_u256(result)
}

/// Calculate a basis-point fraction of a raw value, rounding down
pub fn safe_calculate_bps(value: u128, bps: u16) -> PoolResult<u128> {
    safe_mul_div_u128(value, bps as u128, crate::constants::BPS_DENOMINATOR, Rounding::Down)
}
