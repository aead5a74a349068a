//! Monotonic millisecond timebase
//!
//! Everything time-dependent in the crate takes timestamps as plain `u64`
//! milliseconds. The [`Clock`] trait is the one place they come from, so the
//! polling loop can run against real hardware time or a hand-driven clock.

use core::cell::Cell;

/// Monotonic time source in milliseconds
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// Clock advanced by hand, for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Create a clock starting at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Move time forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to an absolute time; earlier times are ignored
    pub fn set(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embedded")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

#[cfg(feature = "embedded")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
