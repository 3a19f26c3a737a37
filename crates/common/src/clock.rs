//! Clock and frame pacing utilities for preview playback.
//!
//! The playhead never reads the system time directly. It asks a [`Clock`]
//! for monotonic seconds, which lets hosts drive it from a real monotonic
//! source ([`SystemClock`]) and lets tests advance virtual time
//! deterministically ([`ManualClock`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A source of monotonic time in seconds.
pub trait Clock {
    /// Seconds elapsed since this clock's epoch. Never decreases.
    fn now_secs(&self) -> f64;
}

/// Monotonic wall clock anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    /// The instant the clock started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SystemClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since the epoch.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs * 1_000_000_000.0) as u64
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Virtual clock advanced by hand.
///
/// Clones share the same time source, so a test can keep one handle while
/// the playhead owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a virtual clock at `0.0` seconds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a virtual clock at the given time.
    pub fn at(secs: f64) -> Self {
        let clock = Self::new();
        clock.set(secs);
        clock
    }

    /// Move time forward. Negative or non-finite deltas are ignored.
    pub fn advance(&self, secs: f64) {
        if !secs.is_finite() || secs <= 0.0 {
            return;
        }
        self.nanos
            .fetch_add(SystemClock::secs_to_ns(secs), Ordering::SeqCst);
    }

    /// Jump to an absolute time. Requests to move backwards are ignored.
    pub fn set(&self, secs: f64) {
        if !secs.is_finite() || secs < 0.0 {
            return;
        }
        self.nanos
            .fetch_max(SystemClock::secs_to_ns(secs), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        SystemClock::ns_to_secs(self.nanos.load(Ordering::SeqCst))
    }
}

/// Frame rate controller for paced loops.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate. A zero rate is
    /// treated as 1 Hz.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Nanoseconds to wait from `current_ns` until the next tick is due.
    pub fn until_next_ns(&self, current_ns: u64) -> u64 {
        match self.last_tick_ns {
            None => 0,
            Some(last) => (last + self.target_interval_ns).saturating_sub(current_ns),
        }
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_elapsed() {
        let clock = SystemClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(clock.now_secs() >= 0.0);
    }

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((SystemClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(SystemClock::secs_to_ns(2.0), 2_000_000_000);
    }

    #[test]
    fn test_manual_clock_shares_time_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(0.25);
        assert!((clock.now_secs() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::at(3.0);
        clock.set(1.0);
        clock.advance(-2.0);
        clock.advance(f64::NAN);
        assert!((clock.now_secs() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0)); // first tick always fires
        assert!(!ctrl.should_tick(1_000_000)); // 1ms later, too soon
        assert!(ctrl.should_tick(17_000_000)); // ~17ms later (60Hz ~ 16.67ms)
        assert!(ctrl.until_next_ns(17_000_000) > 0);
    }

    #[test]
    fn test_rate_controller_zero_hz_does_not_panic() {
        let ctrl = RateController::new(0);
        assert_eq!(ctrl.interval_ns(), 1_000_000_000);
    }
}
