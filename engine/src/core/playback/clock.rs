//! Playback Clocks
//!
//! Monotonic time sources for the live engine. Production uses the system
//! clock; tests and headless simulation drive a manual clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::core::TimeSec;

/// Monotonic seconds since an arbitrary origin
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeSec;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimeSec {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward; negative or non-finite steps are ignored
    pub fn advance(&self, seconds: TimeSec) {
        if seconds.is_finite() && seconds > 0.0 {
            self.set(self.now() + seconds);
        }
    }

    pub fn set(&self, seconds: TimeSec) {
        self.bits.store(seconds.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeSec {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        assert_eq!(clock.now(), 0.0);
        handle.advance(1.5);
        assert_eq!(clock.now(), 1.5);

        clock.advance(-3.0);
        assert_eq!(handle.now(), 1.5);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
