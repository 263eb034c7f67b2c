//! # Fixed-Point Arithmetic
//!
//! Unsigned decimal fixed point with 18 fractional digits. A [`Fixed18`]
//! wraps its raw scaled integer: `1.5` is stored as `1_500_000_000_000_000_000`.
//!
//! Multiplication and division truncate toward zero and form their
//! intermediates in 256 bits. Overflow, underflow and division by zero are
//! reported as errors.

use std::fmt;
use std::str::FromStr;

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::constants::{DECIMALS, SCALE};
use crate::errors::{PoolError, PoolResult};
use crate::math::safe_math::{
    div_u256, narrow_u256, safe_add_u128, safe_mul_div_u128, safe_mul_u128, safe_sub_u128,
    wide_mul, Rounding,
};

/// Unsigned fixed-point quantity with 18 decimal places
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fixed18(u128);

impl Fixed18 {
    pub const ZERO: Fixed18 = Fixed18(0);
    pub const ONE: Fixed18 = Fixed18(SCALE);
    pub const MAX: Fixed18 = Fixed18(u128::MAX);

    /// Wrap a raw scaled integer
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    /// Raw scaled integer
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Whole units; a `u64` count always fits after scaling
    pub const fn from_units(units: u64) -> Self {
        Self(units as u128 * SCALE)
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Fixed18) -> PoolResult<Fixed18> {
        safe_add_u128(self.0, other.0).map(Self)
    }

    pub fn checked_sub(self, other: Fixed18) -> PoolResult<Fixed18> {
        safe_sub_u128(self.0, other.0).map(Self)
    }

    /// `self * other`, truncated
    pub fn mul(self, other: Fixed18) -> PoolResult<Fixed18> {
        safe_mul_div_u128(self.0, other.0, SCALE, Rounding::Down).map(Self)
    }

    /// `self / other`, truncated
    pub fn div(self, other: Fixed18) -> PoolResult<Fixed18> {
        safe_mul_div_u128(self.0, SCALE, other.0, Rounding::Down).map(Self)
    }

    /// `self * numerator / denominator` with a single rounding step
    pub fn mul_div(self, numerator: Fixed18, denominator: Fixed18, rounding: Rounding) -> PoolResult<Fixed18> {
        safe_mul_div_u128(self.0, numerator.0, denominator.0, rounding).map(Self)
    }

    /// Scale by a plain integer (e.g. elapsed seconds)
    pub fn mul_int(self, factor: u64) -> PoolResult<Fixed18> {
        safe_mul_u128(self.0, factor as u128).map(Self)
    }

    /// Exact product of the raw values; 36 fractional digits
    pub fn wide_product(self, other: Fixed18) -> U256 {
        wide_mul(self.0, other.0)
    }

    /// Divide a wide (36-digit) product by `divisor`, landing back on 18 digits
    pub fn divide_wide(product: U256, divisor: Fixed18, rounding: Rounding) -> PoolResult<Fixed18> {
        let quotient = div_u256(product, U256::from(divisor.0), rounding)?;
        narrow_u256(quotient).map(Self)
    }
}

impl fmt::Display for Fixed18 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Fixed18 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed18({})", self)
    }
}

impl FromStr for Fixed18 {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PoolError::ParseError(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > DECIMALS as usize {
            return Err(invalid());
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole_raw = if whole.is_empty() {
            0
        } else {
            let units: u128 = whole.parse().map_err(|_| invalid())?;
            safe_mul_u128(units, SCALE)?
        };
        let frac_raw = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS as usize);
            padded.parse::<u128>().map_err(|_| invalid())?
        };
        safe_add_u128(whole_raw, frac_raw).map(Self)
    }
}

impl From<Fixed18> for String {
    fn from(value: Fixed18) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Fixed18 {
    type Error = PoolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Fixed18::from_units(100).to_string(), "100");
        assert_eq!(Fixed18::from_raw(SCALE / 2).to_string(), "0.5");
        assert_eq!(Fixed18::from_raw(1).to_string(), "0.000000000000000001");

        assert_eq!("100".parse::<Fixed18>().unwrap(), Fixed18::from_units(100));
        assert_eq!("0.5".parse::<Fixed18>().unwrap(), Fixed18::from_raw(SCALE / 2));
        assert_eq!(".25".parse::<Fixed18>().unwrap(), Fixed18::from_raw(SCALE / 4));
        assert!("1.0000000000000000001".parse::<Fixed18>().is_err());
        assert!("-1".parse::<Fixed18>().is_err());
        assert!("".parse::<Fixed18>().is_err());
        assert!("1e5".parse::<Fixed18>().is_err());
    }

    #[test]
    fn test_mul_div_truncate() {
        let three = Fixed18::from_units(3);
        let third = Fixed18::ONE.div(three).unwrap();
        assert_eq!(third.raw(), 333_333_333_333_333_333);
        // Truncation loses the last digit on the way back
        assert_eq!(third.mul(three).unwrap().raw(), SCALE - 1);

        let half = Fixed18::from_raw(SCALE / 2);
        assert_eq!(half.mul(half).unwrap(), Fixed18::from_raw(SCALE / 4));
    }

    #[test]
    fn test_checked_errors() {
        assert_eq!(Fixed18::ZERO.checked_sub(Fixed18::ONE), Err(PoolError::MathUnderflow));
        assert_eq!(Fixed18::MAX.checked_add(Fixed18::ONE), Err(PoolError::MathOverflow));
        assert_eq!(Fixed18::ONE.div(Fixed18::ZERO), Err(PoolError::DivisionByZero));
        assert_eq!(Fixed18::MAX.mul(Fixed18::from_units(2)), Err(PoolError::MathOverflow));
    }

    #[test]
    fn test_wide_product_roundtrip() {
        let a = Fixed18::from_units(100_000);
        let b = Fixed18::from_units(100_001);
        let k = a.wide_product(b);
        assert_eq!(Fixed18::divide_wide(k, b, Rounding::Down).unwrap(), a);

        let k = a.wide_product(a);
        let down = Fixed18::divide_wide(k, b, Rounding::Down).unwrap();
        let up = Fixed18::divide_wide(k, b, Rounding::Up).unwrap();
        assert_eq!(up.raw(), down.raw() + 1);
    }

    #[test]
    fn test_serde_as_string() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            amount: Fixed18,
        }
        let parsed: Wrapper = toml::from_str("amount = \"2.5\"").unwrap();
        assert_eq!(parsed.amount, Fixed18::from_raw(5 * SCALE / 2));
    }
}
