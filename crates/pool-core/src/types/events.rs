//! # Pool Records
//!
//! Structured records of committed operations for indexers and UIs. A pool
//! hands records to its [`EventSink`] only after the outermost operation
//! commits, so observers never see work that was rolled back.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::math::Fixed18;
use crate::types::{AssetId, ParticipantId, Reserves};

/// Record of one committed reserve-changing operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolEvent {
    Deposit {
        participant: ParticipantId,
        amount_a: Fixed18,
        amount_b: Fixed18,
        shares_issued: Fixed18,
        reserves: Reserves,
        timestamp: i64,
    },
    Withdrawal {
        participant: ParticipantId,
        shares_burned: Fixed18,
        amount_a: Fixed18,
        amount_b: Fixed18,
        reserves: Reserves,
        timestamp: i64,
    },
    Swap {
        participant: ParticipantId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Fixed18,
        amount_out: Fixed18,
        reserves: Reserves,
        timestamp: i64,
    },
    FlashBorrow {
        participant: ParticipantId,
        asset: AssetId,
        amount: Fixed18,
        fee: Fixed18,
        reserves: Reserves,
        timestamp: i64,
    },
}

impl PoolEvent {
    pub fn participant(&self) -> &ParticipantId {
        match self {
            PoolEvent::Deposit { participant, .. }
            | PoolEvent::Withdrawal { participant, .. }
            | PoolEvent::Swap { participant, .. }
            | PoolEvent::FlashBorrow { participant, .. } => participant,
        }
    }

    pub fn reserves(&self) -> Reserves {
        match self {
            PoolEvent::Deposit { reserves, .. }
            | PoolEvent::Withdrawal { reserves, .. }
            | PoolEvent::Swap { reserves, .. }
            | PoolEvent::FlashBorrow { reserves, .. } => *reserves,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            PoolEvent::Deposit { timestamp, .. }
            | PoolEvent::Withdrawal { timestamp, .. }
            | PoolEvent::Swap { timestamp, .. }
            | PoolEvent::FlashBorrow { timestamp, .. } => *timestamp,
        }
    }

    /// Short operation name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PoolEvent::Deposit { .. } => "deposit",
            PoolEvent::Withdrawal { .. } => "withdrawal",
            PoolEvent::Swap { .. } => "swap",
            PoolEvent::FlashBorrow { .. } => "flash_borrow",
        }
    }
}

/// Destination for committed pool records
pub trait EventSink: Send {
    fn emit(&mut self, event: &PoolEvent);
}

/// Default sink: one structured log line per record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &PoolEvent) {
        let reserves = event.reserves();
        tracing::info!(
            kind = event.kind(),
            participant = %event.participant(),
            reserve_a = %reserves.a,
            reserve_b = %reserves.b,
            timestamp = event.timestamp(),
            "pool record"
        );
    }
}

/// Sink that keeps every record in a shared buffer
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<PoolEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records received so far
    pub fn events(&self) -> Vec<PoolEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &PoolEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.emit(&PoolEvent::FlashBorrow {
            participant: "bot".into(),
            asset: "USDC".into(),
            amount: Fixed18::from_units(10),
            fee: Fixed18::from_raw(50_000_000_000_000_000),
            reserves: Reserves::default(),
            timestamp: 7,
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].kind(), "flash_borrow");
        assert_eq!(sink.events()[0].timestamp(), 7);
    }
}
