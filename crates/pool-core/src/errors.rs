//! # Pool Error Types
//!
//! Every failure is returned to the immediate caller. None of them are
//! transient, so nothing here is retried internally.

use thiserror::Error;

use crate::math::Fixed18;

/// Errors produced by pool operations and their collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ========================================================================
    // Liquidity Errors
    // ========================================================================
    
    #[error("Deposit ratio does not match the current reserve ratio")]
    UnbalancedDeposit,
    
    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Fixed18, held: Fixed18 },
    
    #[error("Withdrawal of {requested} shares must be below total shares {total}")]
    ExceedsTotalShares { requested: Fixed18, total: Fixed18 },
    
    // ========================================================================
    // Swap Errors
    // ========================================================================
    
    #[error("Swap output would consume the entire opposing reserve")]
    SwapExceedsPool,
    
    #[error("Swap output truncates to zero")]
    InsufficientOutputAmount,
    
    #[error("Pool has no reserves")]
    EmptyPool,
    
    // ========================================================================
    // Flash-Borrow Errors
    // ========================================================================
    
    #[error("Unsupported asset: {0}")]
    UnsupportedAsset(String),
    
    #[error("Repayment shortfall: expected custody {expected}, found {actual}")]
    RepaymentShortfall { expected: Fixed18, actual: Fixed18 },
    
    #[error("No flash borrow of {0} is outstanding")]
    NoOutstandingLoan(String),
    
    // ========================================================================
    // Transfer Errors (surfaced unchanged from the asset ledger)
    // ========================================================================
    
    #[error("Transfer rejected: {0}")]
    TransferRejected(String),
    
    #[error("Insufficient custody: requested {requested}, held {held}")]
    InsufficientCustody { requested: Fixed18, held: Fixed18 },
    
    // ========================================================================
    // Math Errors
    // ========================================================================
    
    #[error("Math overflow")]
    MathOverflow,
    
    #[error("Math underflow")]
    MathUnderflow,
    
    #[error("Division by zero")]
    DivisionByZero,
    
    #[error("Invalid fixed-point literal: {0}")]
    ParseError(String),
    
    // ========================================================================
    // General Errors
    // ========================================================================
    
    #[error("Invalid amount")]
    InvalidAmount,
    
    #[error("Pool assets must differ, got {0} twice")]
    IdenticalAssets(String),
    
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    
    #[error("Pool lock poisoned")]
    LockPoisoned,
}

/// Result type using pool errors
pub type PoolResult<T> = Result<T, PoolError>;

impl PoolError {
    /// Create an invalid configuration error
    pub fn invalid_config(field: &str, value: &str, expected: &str) -> Self {
        Self::InvalidConfig(format!("{} = {} (expected {})", field, value, expected))
    }
    
    /// Create a transfer rejected error with reason
    pub fn transfer_rejected(reason: impl Into<String>) -> Self {
        Self::TransferRejected(reason.into())
    }
}
