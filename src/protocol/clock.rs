//! Deterministic block clock.
//!
//! The engine never reads wall-clock time. Every timestamp and height it
//! writes comes from the [`BlockContext`] the host clock reports at the start
//! of a transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Height and time of the block a transition executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    /// Unix seconds
    pub time: i64,
}

impl BlockContext {
    pub fn new(height: u64, time: i64) -> Self {
        Self { height, time }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Host-provided monotonic clock
pub trait BlockClock {
    fn block(&self) -> BlockContext;
}

/// Clock driven explicitly by the caller
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: BlockContext,
}

impl ManualClock {
    pub fn new(height: u64, time: i64) -> Self {
        Self {
            current: BlockContext::new(height, time),
        }
    }

    pub fn set(&mut self, height: u64, time: i64) {
        self.current = BlockContext::new(height, time);
    }

    /// Move forward one block and `secs` seconds
    pub fn advance(&mut self, secs: i64) {
        self.current.height += 1;
        self.current.time += secs;
    }
}

impl BlockClock for ManualClock {
    fn block(&self) -> BlockContext {
        self.current
    }
}

/// Fixed block interval from a genesis time: `time = genesis + height * interval`
#[derive(Debug, Clone)]
pub struct IntervalClock {
    genesis_time: i64,
    interval_secs: u64,
    height: u64,
}

impl IntervalClock {
    pub fn new(genesis_time: i64, interval_secs: u64) -> Self {
        Self {
            genesis_time,
            interval_secs,
            height: 0,
        }
    }

    /// Resume at a known height (e.g. after loading persisted state)
    pub fn at_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    pub fn advance(&mut self) -> BlockContext {
        self.height += 1;
        self.block()
    }

    /// Give back the last block (its transition was rejected)
    pub fn rewind(&mut self) -> BlockContext {
        self.height = self.height.saturating_sub(1);
        self.block()
    }

    pub fn height(&self) -> u64 {
        self.height
    }
}

impl BlockClock for IntervalClock {
    fn block(&self) -> BlockContext {
        let elapsed = self.height.saturating_mul(self.interval_secs);
        BlockContext::new(
            self.height,
            self.genesis_time
                .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX)),
        )
    }
}
