//! # Constant-Product Pool
//!
//! [`Pool`] owns the reserve and share ledger, the price accumulator and the
//! two asset ledgers it custodies on. It has four mutating operations:
//!
//! - [`Pool::deposit`] / [`Pool::withdraw`] (liquidity)
//! - [`Pool::swap`] (pricing on `reserve_a * reserve_b = k`)
//! - [`Pool::flash_borrow`] (loan repaid with a fee inside one call)
//!
//! Each one runs against a checkpoint of the whole state, both ledgers
//! included, and any error restores it. Operations invoked from inside a
//! flash-borrow callback nest under the outer checkpoint, and their records
//! reach the event sink only when the outermost operation commits.

mod flash;
mod liquidity;
mod swap;

pub use flash::{FlashBorrower, FlashLoan};

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use ethnum::U256;

use crate::clock::{Clock, SystemClock};
use crate::config::PoolConfig;
use crate::errors::{PoolError, PoolResult};
use crate::ledger::AssetLedger;
use crate::math::Fixed18;
use crate::math::safe_math::safe_calculate_bps;
use crate::oracle::{AccumulatorSnapshot, PriceAccumulator};
use crate::types::{AssetId, EventSink, ParticipantId, PoolEvent, Reserves, Side, TracingSink};

/// Reserve, share and accumulator bookkeeping
#[derive(Debug, Clone)]
struct PoolState {
    reserves: Reserves,
    /// Exact product of the raw reserves (36 fractional digits)
    invariant: U256,
    total_shares: Fixed18,
    shares: BTreeMap<ParticipantId, Fixed18>,
    accumulator: PriceAccumulator,
    /// Principal of flash borrows still inside their callback
    lent: Reserves,
}

struct Checkpoint<S> {
    state: PoolState,
    ledger_a: S,
    ledger_b: S,
    pending: usize,
}

/// Two-asset constant-product liquidity pool
pub struct Pool<L: AssetLedger> {
    config: PoolConfig,
    ledger_a: L,
    ledger_b: L,
    state: PoolState,
    clock: Box<dyn Clock>,
    sink: Box<dyn EventSink>,
    pending: Vec<PoolEvent>,
    depth: u32,
}

impl<L: AssetLedger> Pool<L> {
    /// Create a pool over two ledgers using the wall clock
    pub fn new(config: PoolConfig, ledger_a: L, ledger_b: L) -> PoolResult<Self> {
        Self::with_clock(config, ledger_a, ledger_b, SystemClock)
    }

    /// Create a pool with an explicit time source
    pub fn with_clock(
        config: PoolConfig,
        ledger_a: L,
        ledger_b: L,
        clock: impl Clock + 'static,
    ) -> PoolResult<Self> {
        config.validate()?;
        if ledger_a.asset() == ledger_b.asset() {
            return Err(PoolError::IdenticalAssets(ledger_a.asset().to_string()));
        }

        let start = clock.now();
        tracing::info!(
            asset_a = %ledger_a.asset(),
            asset_b = %ledger_b.asset(),
            flash_fee_bps = config.flash_fee_bps,
            "pool created"
        );

        Ok(Self {
            config,
            ledger_a,
            ledger_b,
            state: PoolState {
                reserves: Reserves::default(),
                invariant: U256::ZERO,
                total_shares: Fixed18::ZERO,
                shares: BTreeMap::new(),
                accumulator: PriceAccumulator::new(start),
                lent: Reserves::default(),
            },
            clock: Box::new(clock),
            sink: Box::new(TracingSink),
            pending: Vec::new(),
            depth: 0,
        })
    }

    /// Replace the destination of committed records
    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    // ========================================================================
    // Read-only queries
    // ========================================================================

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn asset_a(&self) -> &AssetId {
        self.ledger_a.asset()
    }

    pub fn asset_b(&self) -> &AssetId {
        self.ledger_b.asset()
    }

    pub fn reserves(&self) -> Reserves {
        self.state.reserves
    }

    /// Cached `reserve_a * reserve_b` as an exact wide product
    pub fn invariant(&self) -> U256 {
        self.state.invariant
    }

    pub fn total_shares(&self) -> Fixed18 {
        self.state.total_shares
    }

    pub fn share_of(&self, participant: &ParticipantId) -> Fixed18 {
        self.state.shares.get(participant).copied().unwrap_or_default()
    }

    /// Current cumulative prices and their last update time
    pub fn accumulator(&self) -> AccumulatorSnapshot {
        self.state.accumulator.snapshot()
    }

    /// Instantaneous price of one unit of A in units of B
    pub fn spot_price_a_in_b(&self) -> PoolResult<Fixed18> {
        if !self.state.reserves.is_funded() {
            return Err(PoolError::EmptyPool);
        }
        self.state.reserves.b.div(self.state.reserves.a)
    }

    /// Fee charged on a flash borrow of `amount`
    pub fn flash_fee(&self, amount: Fixed18) -> PoolResult<Fixed18> {
        safe_calculate_bps(amount.raw(), self.config.flash_fee_bps).map(Fixed18::from_raw)
    }

    /// Which side of the pool `asset` is
    pub fn side_of(&self, asset: &AssetId) -> PoolResult<Side> {
        if asset == self.ledger_a.asset() {
            Ok(Side::A)
        } else if asset == self.ledger_b.asset() {
            Ok(Side::B)
        } else {
            Err(PoolError::UnsupportedAsset(asset.to_string()))
        }
    }

    pub fn ledger(&self, side: Side) -> &L {
        match side {
            Side::A => &self.ledger_a,
            Side::B => &self.ledger_b,
        }
    }

    fn ledger_mut(&mut self, side: Side) -> &mut L {
        match side {
            Side::A => &mut self.ledger_a,
            Side::B => &mut self.ledger_b,
        }
    }

    /// Check the bookkeeping invariants: `k` matches the reserves, shares sum
    /// to the total, issued shares imply two positive reserves, and each
    /// ledger holds its reserve in custody. While a flash borrow is out, the
    /// lent principal counts toward custody.
    pub fn is_consistent(&self) -> bool {
        let state = &self.state;
        if state.invariant != state.reserves.a.wide_product(state.reserves.b) {
            return false;
        }

        let mut sum = Fixed18::ZERO;
        for held in state.shares.values() {
            if held.is_zero() {
                return false;
            }
            sum = match sum.checked_add(*held) {
                Ok(sum) => sum,
                Err(_) => return false,
            };
        }
        if sum != state.total_shares {
            return false;
        }

        for side in [Side::A, Side::B] {
            let reserve = state.reserves.get(side);
            let lent = state.lent.get(side);
            let custody = self.ledger(side).custody_balance();
            let covered = if lent.is_zero() {
                custody == reserve
            } else {
                custody.checked_add(lent).map_or(false, |held| held >= reserve)
            };
            if !covered {
                return false;
            }
        }

        state.total_shares.is_zero() || state.reserves.is_funded()
    }

    // ========================================================================
    // Transaction plumbing
    // ========================================================================

    /// Run `op` against a checkpoint; restore everything if it fails. A
    /// panic inside `op` (a flash borrower's callback, say) restores the
    /// checkpoint before it keeps unwinding.
    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> PoolResult<T>) -> PoolResult<T> {
        let checkpoint = Checkpoint {
            state: self.state.clone(),
            ledger_a: self.ledger_a.snapshot(),
            ledger_b: self.ledger_b.snapshot(),
            pending: self.pending.len(),
        };

        self.depth += 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| op(self)));
        self.depth -= 1;

        match outcome {
            Ok(Ok(value)) => {
                debug_assert!(self.is_consistent());
                if self.depth == 0 {
                    self.flush_events();
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                tracing::debug!(error = %err, depth = self.depth, "rolling back pool operation");
                self.rollback(checkpoint);
                Err(err)
            }
            Err(payload) => {
                tracing::error!(depth = self.depth, "pool operation panicked, rolling back");
                self.rollback(checkpoint);
                panic::resume_unwind(payload)
            }
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint<L::Snapshot>) {
        self.state = checkpoint.state;
        self.ledger_a.restore(checkpoint.ledger_a);
        self.ledger_b.restore(checkpoint.ledger_b);
        self.pending.truncate(checkpoint.pending);
    }

    /// Advance the accumulator with the pre-mutation reserves; returns the
    /// timestamp of the operation
    fn accrue(&mut self) -> PoolResult<i64> {
        let now = self.clock.now();
        self.state.accumulator.update(&self.state.reserves, now)?;
        Ok(now)
    }

    fn set_reserves(&mut self, reserves: Reserves) {
        self.state.reserves = reserves;
        self.state.invariant = reserves.a.wide_product(reserves.b);
    }

    fn set_shares(&mut self, participant: &ParticipantId, held: Fixed18) {
        if held.is_zero() {
            self.state.shares.remove(participant);
        } else {
            self.state.shares.insert(participant.clone(), held);
        }
    }

    fn record(&mut self, event: PoolEvent) {
        self.pending.push(event);
    }

    fn flush_events(&mut self) {
        for event in self.pending.drain(..) {
            self.sink.emit(&event);
        }
    }
}
