//! `From` implementations bridging `alarm_config` types to `alarm_core` types.

use crate::config::{DeviceCfg, ScheduleConfig, TimingCfg};

// ── TimingCfg ────────────────────────────────────────────────────────────────

impl From<&alarm_config::Timing> for TimingCfg {
    fn from(c: &alarm_config::Timing) -> Self {
        Self {
            cycle_ms: c.cycle_ms,
            debounce_ms: c.debounce_ms,
            trigger_timeout_ms: c.trigger_timeout_ms,
            arm_poll_ms: c.arm_poll_ms,
            schedule_refresh_ms: c.schedule_refresh_ms,
            heartbeat_ms: c.heartbeat_ms,
        }
    }
}

// ── ScheduleConfig ───────────────────────────────────────────────────────────

impl From<&alarm_config::Schedule> for ScheduleConfig {
    fn from(c: &alarm_config::Schedule) -> Self {
        Self {
            enabled: c.enabled,
            start_hour: c.start_hour,
            start_minute: c.start_minute,
            end_hour: c.end_hour,
            end_minute: c.end_minute,
        }
    }
}

// ── DeviceCfg ────────────────────────────────────────────────────────────────

impl From<&alarm_config::Device> for DeviceCfg {
    fn from(c: &alarm_config::Device) -> Self {
        Self {
            id: c.id.clone(),
            pin: c.pin.clone(),
        }
    }
}
