//! Millisecond time source and fixed-cadence tick scheduling
//!
//! Loop logic never reads the wall clock directly. The network loops sample a
//! `Clock` once per iteration and hand the value to the server or client
//! context, so tests can drive the same logic with a logical clock.

use std::time::Instant;

/// Monotonic milliseconds since creation.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncates a clock reading to the 32-bit wire timestamp.
pub fn wire_timestamp(now_ms: u64) -> u32 {
    now_ms as u32
}

/// Tick period for a rate in Hz, truncated to whole milliseconds.
pub fn tick_period_ms(tick_rate: u32) -> u64 {
    1000 / u64::from(tick_rate.max(1))
}

/// Fires at most once per `period_ms`, measured from the last firing.
#[derive(Debug, Clone)]
pub struct Ticker {
    period_ms: u64,
    last_ms: u64,
}

impl Ticker {
    pub fn new(period_ms: u64, start_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: start_ms,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ms) >= self.period_ms
    }

    /// Starts a fresh period at `now_ms` regardless of whether one was due.
    pub fn restart(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// Returns true and restarts the period when a tick is due.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period_ms(60), 16);
        assert_eq!(tick_period_ms(30), 33);
        assert_eq!(tick_period_ms(1000), 1);
        assert_eq!(tick_period_ms(0), 1000);
    }

    #[test]
    fn test_ticker_fires_on_period() {
        let mut ticker = Ticker::new(16, 0);

        assert!(!ticker.poll(15));
        assert!(ticker.poll(16));
        assert!(!ticker.poll(20));
        assert!(!ticker.poll(31));
        assert!(ticker.poll(40));
        assert!(!ticker.is_due(55));
        assert!(ticker.is_due(56));
    }

    #[test]
    fn test_ticker_skips_missed_periods() {
        let mut ticker = Ticker::new(10, 0);
        assert!(ticker.poll(100));
        assert!(!ticker.poll(105));
        assert!(ticker.poll(110));
    }

    #[test]
    fn test_ticker_restart() {
        let mut ticker = Ticker::new(16, 0);
        ticker.restart(10);
        assert!(!ticker.is_due(16));
        assert!(ticker.poll(26));
    }

    #[test]
    fn test_wire_timestamp_wraps() {
        assert_eq!(wire_timestamp(5), 5);
        assert_eq!(wire_timestamp(u64::from(u32::MAX) + 3), 2);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = Clock::new();
        let a = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(clock.now_ms() >= a + 1);
    }
}
