//! Time management for the monitor loop
//!
//! The controller runs against a monotonically increasing millisecond clock
//! that wraps roughly every 49.7 days of continuous operation. Every elapsed
//! comparison in the crate therefore goes through wrapping (modular)
//! subtraction; raw timestamps are never compared with `<`/`>`.

/// Millisecond timestamp from the monotonic system clock.
///
/// Wraps at `u32::MAX`; use [`elapsed_ms`] rather than subtracting directly.
pub type Millis = u32;

/// Microsecond timestamp used by the elapsed-time pulse strategy.
pub type Micros = u32;

/// Elapsed milliseconds between `since` and `now`, tolerant of one wrap.
#[inline]
pub fn elapsed_ms(now: Millis, since: Millis) -> u32 {
    now.wrapping_sub(since)
}

/// Elapsed microseconds between `since` and `now`, tolerant of one wrap.
#[inline]
pub fn elapsed_us(now: Micros, since: Micros) -> u32 {
    now.wrapping_sub(since)
}

/// Source of monotonic milliseconds for the main loop.
pub trait Clock {
    /// Current monotonic time in milliseconds since boot.
    fn now_ms(&self) -> Millis;
}

/// Fixed clock for testing
///
/// Advances only when told to, which makes grace periods and tick intervals
/// deterministic in tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Millis,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: Millis) -> Self {
        Self { now }
    }

    /// Jump to an absolute time.
    pub fn set(&mut self, now: Millis) {
        self.now = now;
    }

    /// Advance by `ms`, wrapping like the real counter does.
    pub fn advance(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> Millis {
        self.now
    }
}

/// Periodic "elapsed since last fired" gate.
///
/// All cadences in the system (poll interval, engine-hours tick, grace
/// period) reduce to this comparison, so the wraparound policy lives in one
/// place.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u32,
    last_fired: Millis,
}

impl Interval {
    /// Create an interval that first fires `period_ms` after `now`.
    pub fn new(period_ms: u32, now: Millis) -> Self {
        Self {
            period_ms,
            last_fired: now,
        }
    }

    /// True once per period; re-arms itself when it fires.
    pub fn ready(&mut self, now: Millis) -> bool {
        if elapsed_ms(now, self.last_fired) > self.period_ms {
            self.last_fired = now;
            true
        } else {
            false
        }
    }

    /// Restart the period from `now` without firing.
    pub fn reset(&mut self, now: Millis) {
        self.last_fired = now;
    }
}
