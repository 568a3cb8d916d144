//! Debounced PIR edge detector.
//!
//! Turns the raw motion line into a stream of accepted rising edges. An edge
//! is accepted only when the detector is not latched and more than the
//! debounce window has passed since the previous accepted edge. The latch is
//! released when the line drops, so a later edge can count again.

/// An accepted rising edge of the motion line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionEvent {
    /// Monotonic timestamp of the edge (ms).
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct MotionDetector {
    debounce_ms: u64,
    last_motion_ms: Option<u64>,
    latched: bool,
}

impl MotionDetector {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            last_motion_ms: None,
            latched: false,
        }
    }

    /// Feed one raw sample; returns an event for an accepted rising edge.
    pub fn observe(&mut self, raw_high: bool, now_ms: u64) -> Option<DetectionEvent> {
        if raw_high {
            if self.latched {
                return None;
            }
            let gap_ok = match self.last_motion_ms {
                None => true,
                Some(last) => now_ms.saturating_sub(last) > self.debounce_ms,
            };
            if !gap_ok {
                tracing::trace!(now_ms, "motion edge inside debounce window");
                return None;
            }
            self.latched = true;
            self.last_motion_ms = Some(now_ms);
            Some(DetectionEvent { at_ms: now_ms })
        } else {
            if self.latched {
                tracing::debug!(now_ms, "motion ended");
            }
            self.latched = false;
            None
        }
    }

    /// Release the latch without touching the debounce timestamp.
    pub fn reset_latch(&mut self) {
        self.latched = false;
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn last_motion_ms(&self) -> Option<u64> {
        self.last_motion_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_is_accepted() {
        let mut d = MotionDetector::new(2000);
        assert_eq!(d.observe(true, 10), Some(DetectionEvent { at_ms: 10 }));
        assert!(d.is_latched());
    }

    #[test]
    fn edge_right_after_boot_is_not_debounced() {
        // no previous edge, so the window does not apply from t = 0
        let mut d = MotionDetector::new(2000);
        assert_eq!(d.last_motion_ms(), None);
        assert_eq!(d.observe(true, 0), Some(DetectionEvent { at_ms: 0 }));
        assert!(d.observe(false, 100).is_none());
        assert!(d.observe(true, 1999).is_none());
    }

    #[test]
    fn held_high_emits_once() {
        let mut d = MotionDetector::new(2000);
        assert!(d.observe(true, 0).is_some());
        for t in (100..10_000).step_by(100) {
            assert!(d.observe(true, t).is_none());
        }
    }

    #[test]
    fn chatter_inside_window_is_suppressed() {
        let mut d = MotionDetector::new(2000);
        assert!(d.observe(true, 0).is_some());
        assert!(d.observe(false, 100).is_none());
        assert!(d.observe(true, 200).is_none());
        assert!(d.observe(false, 300).is_none());
        // exactly at the window edge is still too early
        assert!(d.observe(true, 2000).is_none());
        assert!(d.observe(false, 2050).is_none());
        assert_eq!(d.observe(true, 2001), Some(DetectionEvent { at_ms: 2001 }));
    }

    #[test]
    fn reset_latch_keeps_debounce_timestamp() {
        let mut d = MotionDetector::new(2000);
        assert!(d.observe(true, 0).is_some());
        d.reset_latch();
        assert!(!d.is_latched());
        assert!(d.observe(true, 500).is_none());
        assert_eq!(d.last_motion_ms(), Some(0));
        assert!(d.observe(true, 2500).is_some());
    }
}
