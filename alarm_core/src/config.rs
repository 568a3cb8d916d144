//! Runtime configuration types for the alarm core.
//!
//! These are the structs consumed by `AlarmMachine` and `Node`. They are
//! separate from the TOML-deserialized config in `alarm_config`.

/// Timing knobs for debounce, timeout and the periodic remote tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    /// Pause between control cycles (ms).
    pub cycle_ms: u64,
    /// Minimum gap between two accepted motion events (ms). Default: 2000.
    pub debounce_ms: u64,
    /// Triggered state auto-clears once this much time has passed (ms). Default: 30000.
    pub trigger_timeout_ms: u64,
    /// Remote `status/armed` poll period (ms).
    pub arm_poll_ms: u64,
    /// Schedule refresh + evaluation period (ms).
    pub schedule_refresh_ms: u64,
    /// Telemetry heartbeat period (ms).
    pub heartbeat_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            cycle_ms: 100,
            debounce_ms: 2000,
            trigger_timeout_ms: 30_000,
            arm_poll_ms: 2000,
            schedule_refresh_ms: 10_000,
            heartbeat_ms: 10_000,
        }
    }
}

/// Daily auto-arm window. Refreshed wholesale from the remote store.
///
/// Bounds are not required to differ: `start == end` is a legal, never-active
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 22,
            start_minute: 0,
            end_hour: 6,
            end_minute: 0,
        }
    }
}

impl ScheduleConfig {
    #[inline]
    pub fn start_minutes(&self) -> u16 {
        u16::from(self.start_hour) * 60 + u16::from(self.start_minute)
    }

    #[inline]
    pub fn end_minutes(&self) -> u16 {
        u16::from(self.end_hour) * 60 + u16::from(self.end_minute)
    }
}

impl std::fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}{}",
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
            if self.enabled { "" } else { " (disabled)" }
        )
    }
}

/// Device identity: remote path scope and the PIN commands must carry.
#[derive(Debug, Clone)]
pub struct DeviceCfg {
    pub id: String,
    pub pin: String,
}
