//! Alarm state owned by the state machine.

/// Coarse mode derived from `AlarmState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Disarmed,
    ArmedIdle,
    ArmedTriggered,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Disarmed => "disarmed",
            Mode::ArmedIdle => "armed-idle",
            Mode::ArmedTriggered => "armed-triggered",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide alarm state. Only `AlarmMachine` mutates it.
///
/// Invariant: `triggered` implies `armed`; `triggered_at_ms` is `Some` exactly
/// while triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmState {
    armed: bool,
    triggered: bool,
    triggered_at_ms: Option<u64>,
    last_motion_at_ms: Option<u64>,
}

impl AlarmState {
    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn triggered_at_ms(&self) -> Option<u64> {
        self.triggered_at_ms
    }

    pub fn last_motion_at_ms(&self) -> Option<u64> {
        self.last_motion_at_ms
    }

    pub fn mode(&self) -> Mode {
        match (self.armed, self.triggered) {
            (false, _) => Mode::Disarmed,
            (true, false) => Mode::ArmedIdle,
            (true, true) => Mode::ArmedTriggered,
        }
    }

    pub(crate) fn arm(&mut self) {
        self.armed = true;
    }

    /// Disarm always ends any trigger episode.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
        self.end_episode();
    }

    /// Start a trigger episode. Returns false if one is already running, in
    /// which case `triggered_at_ms` is left alone.
    pub(crate) fn trigger(&mut self, now_ms: u64) -> bool {
        debug_assert!(self.armed, "trigger while disarmed");
        self.last_motion_at_ms = Some(now_ms);
        if self.triggered {
            return false;
        }
        self.triggered = true;
        self.triggered_at_ms = Some(now_ms);
        true
    }

    pub(crate) fn end_episode(&mut self) {
        self.triggered = false;
        self.triggered_at_ms = None;
    }

    /// `triggered ⇒ armed`, and the episode timestamp tracks `triggered`.
    pub fn invariant_holds(&self) -> bool {
        (!self.triggered || self.armed) && (self.triggered == self.triggered_at_ms.is_some())
    }
}
