pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod wall;

pub use wall::ZonedWallClock;

use alarm_traits::{Buzzer, Clock, MonotonicClock, MotionSensor, StatusLed};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Simulated PIR line.
///
/// Either driven by hand through a shared flag (`manual`) or by a repeating
/// pattern: high for `high_ms` at the start of every `period_ms`.
pub struct SimulatedPir {
    level: Rc<Cell<bool>>,
    pattern: Option<Pattern>,
}

struct Pattern {
    clock: Box<dyn Clock>,
    start: Instant,
    period_ms: u64,
    high_ms: u64,
}

impl SimulatedPir {
    /// Line stays low until raised through `handle()`.
    pub fn manual() -> Self {
        Self {
            level: Rc::new(Cell::new(false)),
            pattern: None,
        }
    }

    /// Periodic motion on the real monotonic clock.
    pub fn periodic(period_ms: u64, high_ms: u64) -> Self {
        Self::periodic_with_clock(MonotonicClock::new(), period_ms, high_ms)
    }

    pub fn periodic_with_clock(clock: impl Clock + 'static, period_ms: u64, high_ms: u64) -> Self {
        let start = clock.now();
        Self {
            level: Rc::new(Cell::new(false)),
            pattern: (period_ms > 0).then(|| Pattern {
                clock: Box::new(clock),
                start,
                period_ms,
                high_ms,
            }),
        }
    }

    /// Shared handle to the line level (manual mode).
    pub fn handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.level)
    }
}

impl MotionSensor for SimulatedPir {
    fn read(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(p) = &self.pattern {
            let phase = p.clock.ms_since(p.start) % p.period_ms;
            let high = phase < p.high_ms;
            if high != self.level.get() {
                tracing::debug!(high, "simulated pir");
            }
            self.level.set(high);
        }
        Ok(self.level.get())
    }
}

/// Simulated buzzer: remembers the current tone and logs changes.
#[derive(Default)]
pub struct SimulatedBuzzer {
    tone: Rc<Cell<Option<u32>>>,
}

impl SimulatedBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the current tone (`None` = silent).
    pub fn handle(&self) -> Rc<Cell<Option<u32>>> {
        Rc::clone(&self.tone)
    }
}

impl Buzzer for SimulatedBuzzer {
    fn tone(&mut self, hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(hz, "buzzer tone (simulated)");
        self.tone.set(Some(hz));
        Ok(())
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.tone.get().is_some() {
            tracing::debug!("buzzer off (simulated)");
        }
        self.tone.set(None);
        Ok(())
    }
}

/// Simulated status LED.
#[derive(Default)]
pub struct SimulatedLed {
    on: Rc<Cell<bool>>,
}

impl SimulatedLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.on)
    }
}

impl StatusLed for SimulatedLed {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if on != self.on.get() {
            tracing::debug!(on, "status led (simulated)");
        }
        self.on.set(on);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarm_traits::ManualClock;
    use std::time::Duration;

    #[test]
    fn manual_pir_follows_handle() {
        let mut pir = SimulatedPir::manual();
        let h = pir.handle();
        assert!(!pir.read().unwrap());
        h.set(true);
        assert!(pir.read().unwrap());
    }

    #[test]
    fn periodic_pir_pattern() {
        let clock = ManualClock::new();
        let mut pir = SimulatedPir::periodic_with_clock(clock.clone(), 1000, 300);
        assert!(pir.read().unwrap());
        clock.advance(Duration::from_millis(300));
        assert!(!pir.read().unwrap());
        clock.advance(Duration::from_millis(700));
        assert!(pir.read().unwrap());
    }

    #[test]
    fn zero_period_never_fires() {
        let mut pir = SimulatedPir::periodic_with_clock(ManualClock::new(), 0, 100);
        assert!(!pir.read().unwrap());
    }

    #[test]
    fn buzzer_and_led_track_state() {
        let mut b = SimulatedBuzzer::new();
        let tone = b.handle();
        b.tone(2500).unwrap();
        assert_eq!(tone.get(), Some(2500));
        b.stop().unwrap();
        assert_eq!(tone.get(), None);

        let mut led = SimulatedLed::new();
        let on = led.handle();
        led.set(true).unwrap();
        assert!(on.get());
    }
}
