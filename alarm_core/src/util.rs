//! Common time/period helpers for alarm_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Convert Unix seconds to the epoch-millisecond form stored in `lastMotion`.
#[inline]
pub fn epoch_ms(unix_seconds: i64) -> i64 {
    unix_seconds.saturating_mul(MILLIS_PER_SEC as i64)
}

/// Fixed-period gate driven by the monotonic clock.
///
/// The first call to `due()` fires immediately; afterwards it fires once at
/// least `period_ms` has passed since the last firing.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    period_ms: u64,
    last_ms: Option<u64>,
}

impl Periodic {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            last_ms: None,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Returns true (and re-arms) when the period has elapsed.
    pub fn due(&mut self, now_ms: u64) -> bool {
        let fire = match self.last_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.period_ms,
        };
        if fire {
            self.last_ms = Some(now_ms);
        }
        fire
    }

    /// Force the next `due()` to fire.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
