//! Wall-clock source for allocation and capture timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond wall clock. Injected so tests can pin allocation timestamps.
pub trait Clock: Send {
    fn now_epoch_ms(&self) -> i64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}
