//! # Pool Constants
//!
//! Fixed-point scale, fee denominators and configuration defaults.

// ============================================================================
// Fixed-Point Constants
// ============================================================================

/// Number of fractional decimal digits carried by [`crate::Fixed18`]
pub const DECIMALS: u32 = 18;

/// Raw value of one whole unit: 10^18
pub const SCALE: u128 = 1_000_000_000_000_000_000;

// ============================================================================
// Fee Constants
// ============================================================================

/// Basis points denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Maximum fee rate in basis points (100%)
pub const MAX_FEE_BPS: u16 = 10_000;

/// Default flash-borrow fee (0.5%)
pub const DEFAULT_FLASH_FEE_BPS: u16 = 50;

// ============================================================================
// Share Constants
// ============================================================================

/// Shares issued by the first deposit into an empty pool, in whole units
pub const DEFAULT_BOOTSTRAP_SHARE_UNITS: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_validity() {
        assert_eq!(SCALE, 10u128.pow(DECIMALS));
        assert_eq!(BPS_DENOMINATOR, MAX_FEE_BPS as u128);
        assert!(DEFAULT_FLASH_FEE_BPS < MAX_FEE_BPS);
        assert!(DEFAULT_BOOTSTRAP_SHARE_UNITS > 0);
    }
}
