//! Shared helpers for pool integration tests

#![allow(dead_code)]

use pool_core::{
    Fixed18, ManualClock, ParticipantId, Pool, PoolConfig, RecordingSink, Side, TokenLedger,
};

pub const ASSET_A: &str = "AAA";
pub const ASSET_B: &str = "BBB";

/// Starting balance (and pool allowance) of every funded participant
pub const FUNDING_UNITS: u64 = 1_000_000_000_000;

pub fn units(n: u64) -> Fixed18 {
    Fixed18::from_units(n)
}

pub fn id(name: &str) -> ParticipantId {
    ParticipantId::from(name)
}

/// Route `RUST_LOG`-filtered logs to the test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub pool: Pool<TokenLedger>,
    pub clock: ManualClock,
    pub sink: RecordingSink,
}

impl Harness {
    /// Pool with default config at t = 1000 and the given participants funded
    pub fn new(participants: &[&str]) -> Self {
        Self::with_config(PoolConfig::default(), participants)
    }

    pub fn with_config(config: PoolConfig, participants: &[&str]) -> Self {
        init_tracing();
        let mut ledger_a = TokenLedger::new(ASSET_A);
        let mut ledger_b = TokenLedger::new(ASSET_B);
        for name in participants {
            let who = id(name);
            for ledger in [&mut ledger_a, &mut ledger_b] {
                ledger.mint(&who, units(FUNDING_UNITS)).unwrap();
                ledger.approve(&who, units(FUNDING_UNITS));
            }
        }

        let clock = ManualClock::new(1_000);
        let sink = RecordingSink::new();
        let pool = Pool::with_clock(config, ledger_a, ledger_b, clock.clone())
            .unwrap()
            .with_event_sink(sink.clone());
        Self { pool, clock, sink }
    }

    pub fn balance(&self, side: Side, who: &str) -> Fixed18 {
        use pool_core::AssetLedger;
        self.pool.ledger(side).balance_of(&id(who))
    }

    pub fn custody(&self, side: Side) -> Fixed18 {
        use pool_core::AssetLedger;
        self.pool.ledger(side).custody_balance()
    }
}
