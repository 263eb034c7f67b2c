//! # Pool Core - Constant-Product Pair Pool
//!
//! State-transition logic for a two-asset constant-product liquidity pool:
//!
//! - Reserve and share accounting (deposit / withdraw)
//! - Swap pricing under the `x * y = k` invariant
//! - Time-weighted price accumulator
//! - Atomic flash borrowing with a fixed fee
//!
//! All quantities use [`Fixed18`], an unsigned decimal fixed-point type with
//! 18 fractional digits. Every arithmetic step is checked and truncates toward
//! zero; nothing wraps.
//!
//! The fungible-asset ledgers the pool custodies are collaborators behind the
//! [`AssetLedger`] trait. [`TokenLedger`] is an in-memory implementation.

pub mod clock;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod shared;
pub mod types;

// Re-export commonly used items
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PoolConfig;
pub use constants::*;
pub use errors::{PoolError, PoolResult};
pub use ledger::{AssetLedger, TokenLedger};
pub use math::{Fixed18, Rounding};
pub use oracle::{average_price, AccumulatorSnapshot, PriceAccumulator};
pub use pool::{FlashBorrower, FlashLoan, Pool};
pub use shared::SharedPool;
pub use types::*;
