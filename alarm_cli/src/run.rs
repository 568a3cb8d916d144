//! Node assembly: config mapping, hardware selection and the subcommands.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use alarm_core::annunciator::CHIRP_STEPS;
use alarm_core::error::Result;
use alarm_core::{JsonFileStore, Node, RunSummary, ScheduleConfig, is_active};
use alarm_hardware::ZonedWallClock;
use alarm_traits::{Buzzer, MotionSensor, StatusLed, TimeOfDay};

/// Sensor and actuators for one node.
pub struct Devices {
    pub sensor: Box<dyn MotionSensor>,
    pub buzzer: Box<dyn Buzzer>,
    pub led: Box<dyn StatusLed>,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_devices(cfg: &alarm_config::Config) -> Result<Devices> {
    use alarm_hardware::gpio::{GpioBuzzer, GpioLed, GpioPir, open};
    let gpio = open()?;
    tracing::info!(
        pir = cfg.pins.pir,
        buzzer = cfg.pins.buzzer,
        led = cfg.pins.led,
        "gpio devices"
    );
    Ok(Devices {
        sensor: Box::new(GpioPir::new(&gpio, cfg.pins.pir)?),
        buzzer: Box::new(GpioBuzzer::new(&gpio, cfg.pins.buzzer)?),
        led: Box::new(GpioLed::new(&gpio, cfg.pins.led)?),
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_devices(cfg: &alarm_config::Config) -> Result<Devices> {
    use alarm_hardware::{SimulatedBuzzer, SimulatedLed, SimulatedPir};
    let sensor = if cfg.sim.motion_period_ms > 0 {
        tracing::info!(
            period_ms = cfg.sim.motion_period_ms,
            high_ms = cfg.sim.motion_high_ms,
            "simulated pir with periodic motion"
        );
        SimulatedPir::periodic(cfg.sim.motion_period_ms, cfg.sim.motion_high_ms)
    } else {
        SimulatedPir::manual()
    };
    Ok(Devices {
        sensor: Box::new(sensor),
        buzzer: Box::new(SimulatedBuzzer::new()),
        led: Box::new(SimulatedLed::new()),
    })
}

/// Build the node from config and run it until shutdown.
pub fn run_node(
    cfg: &alarm_config::Config,
    store_path: Option<&Path>,
    max_cycles: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary> {
    let store = JsonFileStore::new(store_path.unwrap_or(cfg.store.path.as_path()));
    tracing::info!(store = %store.path().display(), device = %cfg.device.id, "starting node");
    let wall = ZonedWallClock::new(&cfg.clock.timezone)?;
    let devices = open_devices(cfg)?;
    let mut node = Node::builder()
        .with_config(cfg)
        .with_sensor(devices.sensor)
        .with_buzzer(devices.buzzer)
        .with_led(devices.led)
        .with_store(store)
        .with_wall_clock(wall)
        .try_build()?;
    node.self_test()?;
    node.run(&shutdown, max_cycles)
}

/// Outcome of `self-check`.
#[derive(Debug)]
pub struct SelfCheck {
    pub timezone: String,
    pub local_time: Option<TimeOfDay>,
    pub store_ready: bool,
}

/// Play the arm chirp once and blink the LED.
pub fn self_check(cfg: &alarm_config::Config) -> Result<SelfCheck> {
    use alarm_traits::{RemoteStore, WallClock};

    let wall = ZonedWallClock::new(&cfg.clock.timezone)?;
    let mut devices = open_devices(cfg)?;
    let hw = |e: Box<dyn std::error::Error + Send + Sync>| eyre::eyre!("self-check: {e}");

    devices.led.set(true).map_err(hw)?;
    for (tone, ms) in CHIRP_STEPS {
        match tone {
            Some(hz) => devices.buzzer.tone(hz).map_err(hw)?,
            None => devices.buzzer.stop().map_err(hw)?,
        }
        std::thread::sleep(Duration::from_millis(ms));
    }
    devices.buzzer.stop().map_err(hw)?;
    devices.led.set(false).map_err(hw)?;
    let motion = devices.sensor.read().map_err(hw)?;
    tracing::info!(motion, "pir line read");

    let store = JsonFileStore::new(&cfg.store.path);
    let store_ready = store.is_ready();
    if !store_ready {
        tracing::warn!(store = %store.path().display(), "store file is not readable JSON");
    }
    Ok(SelfCheck {
        timezone: cfg.clock.timezone.clone(),
        local_time: wall.time_of_day(),
        store_ready,
    })
}

/// Evaluate the configured schedule window at `at`.
pub fn schedule_at(cfg: &alarm_config::Config, at: TimeOfDay) -> (ScheduleConfig, bool) {
    let sched = ScheduleConfig::from(&cfg.schedule);
    let active = is_active(&sched, at.hour, at.minute);
    (sched, active)
}
