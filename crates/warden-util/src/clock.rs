//! Wall-clock abstraction for wardend
//!
//! Every remaining/elapsed computation in the engine is derived from
//! wall-clock timestamps, never from a count of tick callbacks, so the
//! clock is the single time source the whole service depends on. Tests
//! drive time explicitly through `ManualClock`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Result, WardenError};

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Result<EpochMillis>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Result<EpochMillis> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| WardenError::clock(e.to_string()))?;
        Ok(since_epoch.as_millis() as i64)
    }
}

/// A clock that only moves when told to (for tests).
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: EpochMillis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: EpochMillis) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Result<EpochMillis> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

/// Whole seconds elapsed between two timestamps, floored like the
/// display math expects.
pub fn elapsed_secs(start_ms: EpochMillis, now_ms: EpochMillis) -> i64 {
    (now_ms - start_ms).div_euclid(1000)
}
