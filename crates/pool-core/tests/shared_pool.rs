//! Concurrent access through the shared handle

mod common;

use std::thread;

use common::*;
use pool_core::{Fixed18, FlashLoan, Pool, PoolResult, SharedPool, Side, SwapDirection, TokenLedger};

#[test]
fn test_concurrent_swaps_keep_books_consistent() {
    let traders = ["t0", "t1", "t2", "t3"];
    let mut names = vec!["lp"];
    names.extend_from_slice(&traders);
    let mut h = Harness::new(&names);
    h.pool.deposit(&id("lp"), units(1_000_000), units(1_000_000)).unwrap();
    let shared = SharedPool::new(h.pool);

    let handles: Vec<_> = traders
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let pool = shared.clone();
            let trader = id(name);
            thread::spawn(move || {
                for round in 0..50 {
                    let direction = if (i + round) % 2 == 0 {
                        SwapDirection::AForB
                    } else {
                        SwapDirection::BForA
                    };
                    pool.swap(&trader, direction, units(100)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    shared
        .with(|pool| {
            use pool_core::AssetLedger;
            assert!(pool.is_consistent());
            assert_eq!(pool.ledger(Side::A).custody_balance(), pool.reserves().a);
            assert_eq!(pool.ledger(Side::B).custody_balance(), pool.reserves().b);
            Ok(())
        })
        .unwrap();
    assert_eq!(h.sink.len(), 1 + traders.len() * 50);
}

#[test]
fn test_flash_callback_reenters_under_the_same_lock() {
    let mut h = Harness::new(&["lp", "bot"]);
    h.pool.deposit(&id("lp"), units(1_000), units(1_000)).unwrap();
    let shared = SharedPool::new(h.pool);

    let mut callback = |pool: &mut Pool<TokenLedger>, loan: &FlashLoan<'_>| -> PoolResult<()> {
        pool.swap_b_for_a(loan.borrower, units(10))?;
        assert!(pool.reserves().b > units(1_000));
        pool.repay(loan, loan.repayment()?)
    };
    let fee = shared
        .flash_borrow(&id("bot"), &ASSET_A.into(), units(100), &[], &mut callback)
        .unwrap();
    assert_eq!(fee, "0.5".parse::<Fixed18>().unwrap());
    assert!(shared.with(|pool| Ok(pool.is_consistent())).unwrap());
}
