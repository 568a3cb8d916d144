#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the alarm node.
//!
//! `Config` and its sections are deserialized from TOML and checked with
//! `Config::validate()`. Only `[device]` is mandatory; everything else falls
//! back to the firmware defaults.
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Device {
    /// Device id; remote paths are scoped under `devices/<id>/`.
    pub id: String,
    /// PIN that remote arm/disarm commands must carry.
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub pir: u8,
    pub buzzer: u8,
    pub led: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            pir: 13,
            buzzer: 4,
            led: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Pause between control cycles (ms)
    pub cycle_ms: u64,
    /// Minimum gap between two accepted motion events (ms)
    pub debounce_ms: u64,
    /// Triggered state clears itself after this long (ms)
    pub trigger_timeout_ms: u64,
    /// How often `status/armed` is polled (ms)
    pub arm_poll_ms: u64,
    /// How often the schedule is re-read and evaluated (ms)
    pub schedule_refresh_ms: u64,
    /// How often armed/pir telemetry is pushed (ms)
    pub heartbeat_ms: u64,
}

impl Default for Timing {
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

/// Local schedule used until the remote store provides one.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl Default for Schedule {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClockCfg {
    /// IANA timezone used to derive local hour/minute for the schedule.
    pub timezone: String,
}

impl Default for ClockCfg {
    fn default() -> Self {
        Self {
            timezone: "Europe/Sarajevo".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Store {
    /// JSON document backing the remote store in file mode.
    pub path: PathBuf,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            path: PathBuf::from("var/alarm_store.json"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Simulated PIR behaviour for runs without hardware.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sim {
    /// Raise the simulated PIR line once per period (0 = never)
    pub motion_period_ms: u64,
    /// How long the line stays high each period
    pub motion_high_ms: u64,
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            motion_period_ms: 0,
            motion_high_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub device: Device,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub clock: ClockCfg,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub sim: Sim,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.id.trim().is_empty() {
            eyre::bail!("device.id must not be empty");
        }
        if self.device.id.contains('/') {
            eyre::bail!("device.id must not contain '/'");
        }
        if self.device.pin.is_empty() {
            eyre::bail!("device.pin must not be empty");
        }
        if self.device.pin.chars().any(char::is_whitespace) {
            eyre::bail!("device.pin must not contain whitespace");
        }

        // Timing
        let t = &self.timing;
        if t.cycle_ms == 0 || t.cycle_ms > 1000 {
            eyre::bail!("timing.cycle_ms must be in [1, 1000]");
        }
        if t.debounce_ms == 0 {
            eyre::bail!("timing.debounce_ms must be >= 1");
        }
        if t.trigger_timeout_ms == 0 {
            eyre::bail!("timing.trigger_timeout_ms must be >= 1");
        }
        if t.trigger_timeout_ms > 60 * 60 * 1000 {
            eyre::bail!("timing.trigger_timeout_ms is unreasonably large (>1h)");
        }
        if t.arm_poll_ms == 0 {
            eyre::bail!("timing.arm_poll_ms must be >= 1");
        }
        if t.schedule_refresh_ms == 0 {
            eyre::bail!("timing.schedule_refresh_ms must be >= 1");
        }
        if t.heartbeat_ms == 0 {
            eyre::bail!("timing.heartbeat_ms must be >= 1");
        }

        // Schedule
        let s = &self.schedule;
        if s.start_hour > 23 || s.end_hour > 23 {
            eyre::bail!("schedule hours must be in [0, 23]");
        }
        if s.start_minute > 59 || s.end_minute > 59 {
            eyre::bail!("schedule minutes must be in [0, 59]");
        }

        // Clock
        if self.clock.timezone.trim().is_empty() {
            eyre::bail!("clock.timezone must not be empty");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Sim
        if self.sim.motion_period_ms > 0 && self.sim.motion_high_ms >= self.sim.motion_period_ms {
            eyre::bail!("sim.motion_high_ms must be < sim.motion_period_ms");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_firmware_defaults() {
        let cfg = load_toml(
            r#"
[device]
id = "alarm_esp32_main"
pin = "1234"
"#,
        )
        .expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.timing.debounce_ms, 2000);
        assert_eq!(cfg.timing.trigger_timeout_ms, 30_000);
        assert_eq!(cfg.pins.pir, 13);
        assert!(!cfg.schedule.enabled);
        assert_eq!((cfg.schedule.start_hour, cfg.schedule.end_hour), (22, 6));
    }

    #[test]
    fn missing_device_section_is_a_parse_error() {
        assert!(load_toml("[timing]\ncycle_ms = 100\n").is_err());
    }
}
