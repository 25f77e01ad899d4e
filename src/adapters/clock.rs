//! Monotonic clock adapter.
//!
//! All controller timing is expressed as milliseconds since an
//! arbitrary monotonic epoch; this adapter anchors that epoch at
//! construction time.

use std::time::Instant;

/// Millisecond-resolution monotonic clock.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
