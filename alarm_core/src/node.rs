//! The control cycle: gathers inputs from the collaborators, runs the state
//! machine, executes the resulting intents and drives the buzzer and LED.
//!
//! Nothing here is fatal. A collaborator failure is logged, recorded in the
//! `CycleReport`, and the cycle carries on with "no change" for that input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use alarm_traits::{Buzzer, Clock, MonotonicClock, MotionSensor, RemoteStore, StatusLed, WallClock};

use crate::annunciator::{Annunciator, BuzzerOutput, SELF_TEST_HZ, SELF_TEST_MS};
use crate::config::{DeviceCfg, ScheduleConfig, TimingCfg};
use crate::error::{AlarmError, BuildError, Result};
use crate::hw_error::{Boundary, map_collaborator_error};
use crate::intent::{Alert, Intent};
use crate::machine::{AlarmMachine, CycleInputs, ScheduleSample};
use crate::remote::{Paths, fetch_schedule, parse_command};
use crate::state::{AlarmState, Mode};
use crate::util::{Periodic, epoch_ms};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Text stored under `motionLogs/<unix seconds>`.
pub const MOTION_LOG_TEXT: &str = "Motion detected";

/// Outcome of one `Node::cycle()`.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub now_ms: u64,
    pub mode: Mode,
    pub store_ready: bool,
    pub intents: Vec<Intent>,
    pub buzzer: BuzzerOutput,
    pub led: bool,
    pub failures: Vec<AlarmError>,
}

/// Totals returned by `Node::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failures: u64,
    pub final_mode: Mode,
}

pub struct Node {
    paths: Paths,
    timing: TimingCfg,
    machine: AlarmMachine,
    annunciator: Annunciator,
    schedule: ScheduleConfig,
    sensor: Box<dyn MotionSensor>,
    buzzer: Box<dyn Buzzer>,
    led: Box<dyn StatusLed>,
    store: Box<dyn RemoteStore>,
    wall: Box<dyn WallClock>,
    clock: Box<dyn Clock>,
    epoch: Instant,
    announced: bool,
    schedule_timer: Periodic,
    arm_poll_timer: Periodic,
    heartbeat_timer: Periodic,
    last_pir: bool,
    buzzer_out: Option<BuzzerOutput>,
    led_out: Option<bool>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("paths", &self.paths)
            .field("mode", &self.machine.mode())
            .field("schedule", &self.schedule)
            .field("announced", &self.announced)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn builder() -> NodeBuilder {
        NodeBuilder::default()
    }

    pub fn state(&self) -> &AlarmState {
        self.machine.state()
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    /// Schedule currently in effect (last successful refresh).
    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn timing(&self) -> &TimingCfg {
        &self.timing
    }

    /// Milliseconds on the monotonic clock since the node was built.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Power-on beep. Blocks for the length of the beep.
    pub fn self_test(&mut self) -> Result<()> {
        tracing::info!(hz = SELF_TEST_HZ, ms = SELF_TEST_MS, "buzzer self-test");
        self.buzzer
            .tone(SELF_TEST_HZ)
            .map_err(|e| eyre::Report::new(map_collaborator_error(Boundary::Hardware, &*e)))?;
        self.clock.sleep(Duration::from_millis(SELF_TEST_MS));
        self.buzzer
            .stop()
            .map_err(|e| eyre::Report::new(map_collaborator_error(Boundary::Hardware, &*e)))?;
        self.buzzer_out = Some(BuzzerOutput::Off);
        Ok(())
    }

    /// Run one control cycle to completion.
    pub fn cycle(&mut self) -> CycleReport {
        let now = self.now_ms();
        let mut failures = Vec::new();

        let ready = self.store.is_ready();
        if ready && !self.announced {
            self.announced = true;
            tracing::info!(device = %self.paths.root(), "remote store ready");
            self.publish_alert(Alert::Connected, &mut failures);
            self.schedule_timer.reset();
        }

        let inputs = CycleInputs {
            now_ms: now,
            schedule: self.sample_schedule(ready, now, &mut failures),
            remote_armed: self.poll_armed(ready, now, &mut failures),
            command: self.read_command(ready, &mut failures),
            motion: self.read_motion(&mut failures),
        };

        let intents = self.machine.step(&inputs);
        for intent in &intents {
            self.execute(intent, ready, now, &mut failures);
        }

        if ready && self.heartbeat_timer.due(now) {
            self.heartbeat(&mut failures);
        }

        let buzzer = self.annunciator.resolve(now);
        self.drive_buzzer(buzzer, &mut failures);
        let led = self.annunciator.led();
        self.drive_led(led, &mut failures);

        let mode = self.machine.mode();
        tracing::trace!(
            now_ms = now,
            mode = %mode,
            intents = intents.len(),
            failures = failures.len(),
            "cycle complete"
        );
        CycleReport {
            now_ms: now,
            mode,
            store_ready: ready,
            intents,
            buzzer,
            led,
            failures,
        }
    }

    /// Cycle until `shutdown` is set or `max_cycles` have run, then silence
    /// the annunciator.
    pub fn run(&mut self, shutdown: &AtomicBool, max_cycles: Option<u64>) -> Result<RunSummary> {
        let pause = Duration::from_millis(self.timing.cycle_ms);
        let mut cycles = 0u64;
        let mut failures = 0u64;
        tracing::info!(
            cycle_ms = self.timing.cycle_ms,
            schedule = %self.schedule,
            "control loop started"
        );
        while !shutdown.load(Ordering::Relaxed) {
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
            let report = self.cycle();
            cycles += 1;
            failures += report.failures.len() as u64;
            self.clock.sleep(pause);
        }
        self.shutdown()?;
        let summary = RunSummary {
            cycles,
            failures,
            final_mode: self.machine.mode(),
        };
        tracing::info!(
            cycles,
            failures,
            mode = %summary.final_mode,
            "control loop stopped"
        );
        Ok(summary)
    }

    /// Silence the buzzer and clear the LED.
    pub fn shutdown(&mut self) -> Result<()> {
        let stop = self.buzzer.stop();
        let led = self.led.set(false);
        self.buzzer_out = Some(BuzzerOutput::Off);
        self.led_out = Some(false);
        stop.map_err(|e| eyre::Report::new(map_collaborator_error(Boundary::Hardware, &*e)))?;
        led.map_err(|e| eyre::Report::new(map_collaborator_error(Boundary::Hardware, &*e)))?;
        Ok(())
    }

    fn sample_schedule(
        &mut self,
        ready: bool,
        now: u64,
        failures: &mut Vec<AlarmError>,
    ) -> Option<ScheduleSample> {
        if !self.schedule_timer.due(now) {
            return None;
        }
        if ready {
            let (fresh, errors) = fetch_schedule(self.store.as_mut(), &self.paths, &self.schedule);
            for e in errors {
                tracing::warn!(error = %e, "schedule refresh read failed");
                failures.push(e);
            }
            if fresh != self.schedule {
                tracing::info!(old = %self.schedule, new = %fresh, "schedule updated");
                self.schedule = fresh;
            }
        }
        match self.wall.time_of_day() {
            Some(now) => Some(ScheduleSample {
                config: self.schedule,
                now,
            }),
            None => {
                tracing::debug!("wall clock not synchronized, schedule not evaluated");
                None
            }
        }
    }

    fn poll_armed(&mut self, ready: bool, now: u64, failures: &mut Vec<AlarmError>) -> Option<bool> {
        if !ready || !self.arm_poll_timer.due(now) {
            return None;
        }
        match self.store.get_bool(&self.paths.armed()) {
            Ok(v) => v,
            Err(e) => {
                let err = map_collaborator_error(Boundary::Store, &*e);
                tracing::warn!(error = %err, "armed poll failed");
                failures.push(err);
                None
            }
        }
    }

    fn read_command(
        &mut self,
        ready: bool,
        failures: &mut Vec<AlarmError>,
    ) -> Option<crate::remote::RemoteCommand> {
        if !ready {
            return None;
        }
        let text = match self.store.get_json(&self.paths.commands()) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                let err = map_collaborator_error(Boundary::Store, &*e);
                tracing::warn!(error = %err, "command read failed");
                failures.push(err);
                return None;
            }
        };
        match parse_command(&text) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparsable command");
                None
            }
        }
    }

    fn read_motion(&mut self, failures: &mut Vec<AlarmError>) -> Option<bool> {
        if !self.machine.state().armed() {
            return None;
        }
        match self.sensor.read() {
            Ok(level) => {
                self.last_pir = level;
                Some(level)
            }
            Err(e) => {
                let err = map_collaborator_error(Boundary::Hardware, &*e);
                tracing::warn!(error = %err, "motion sensor read failed");
                failures.push(err);
                None
            }
        }
    }

    fn execute(&mut self, intent: &Intent, ready: bool, now: u64, failures: &mut Vec<AlarmError>) {
        match *intent {
            Intent::Sound(cue) => self.annunciator.cue(cue, now),
            Intent::Led(on) => self.annunciator.set_led(on),
            Intent::SetRemoteArmed(v) => {
                let path = self.paths.armed();
                self.write(ready, failures, |s| s.set_bool(&path, v));
            }
            Intent::SetRemoteTriggered(v) => {
                let path = self.paths.triggered();
                self.write(ready, failures, |s| s.set_bool(&path, v));
            }
            Intent::Alert(alert) => {
                if ready {
                    self.publish_alert(alert, failures);
                } else {
                    tracing::info!(alert = %alert, "alert not published, store offline");
                }
            }
            Intent::LogMotion { at_ms } => self.log_motion(ready, at_ms, failures),
            Intent::DeleteCommand => {
                let path = self.paths.commands();
                self.write(ready, failures, |s| s.delete_node(&path));
            }
        }
    }

    fn publish_alert(&mut self, alert: Alert, failures: &mut Vec<AlarmError>) {
        tracing::info!(alert = %alert, "alert");
        let path = self.paths.last_alert();
        self.write(true, failures, |s| s.set_string(&path, alert.message()));
    }

    fn log_motion(&mut self, ready: bool, at_ms: u64, failures: &mut Vec<AlarmError>) {
        let Some(secs) = self.wall.unix_seconds() else {
            tracing::warn!(at_ms, "wall clock not synchronized, motion log skipped");
            return;
        };
        let log_path = self.paths.motion_log(secs);
        self.write(ready, failures, |s| s.set_string(&log_path, MOTION_LOG_TEXT));
        let last_path = self.paths.last_motion();
        self.write(ready, failures, |s| s.set_int(&last_path, epoch_ms(secs)));
    }

    fn heartbeat(&mut self, failures: &mut Vec<AlarmError>) {
        if !self.machine.state().armed() {
            match self.sensor.read() {
                Ok(level) => self.last_pir = level,
                Err(e) => {
                    let err = map_collaborator_error(Boundary::Hardware, &*e);
                    tracing::warn!(error = %err, "motion sensor read failed");
                    failures.push(err);
                }
            }
        }
        let armed = self.machine.state().armed();
        let pir = self.last_pir;
        tracing::debug!(armed, pir, "heartbeat");
        let armed_path = self.paths.armed();
        self.write(true, failures, |s| s.set_bool(&armed_path, armed));
        let pir_path = self.paths.pir();
        self.write(true, failures, |s| s.set_int(&pir_path, i64::from(pir)));
    }

    /// Perform one remote write, skipping it while the store is offline.
    fn write<F>(&mut self, ready: bool, failures: &mut Vec<AlarmError>, op: F)
    where
        F: FnOnce(&mut dyn RemoteStore) -> std::result::Result<(), BoxError>,
    {
        if !ready {
            tracing::debug!("store offline, write skipped");
            return;
        }
        if let Err(e) = op(self.store.as_mut()) {
            let err = map_collaborator_error(Boundary::Store, &*e);
            tracing::warn!(error = %err, "remote write failed");
            failures.push(err);
        }
    }

    fn drive_buzzer(&mut self, out: BuzzerOutput, failures: &mut Vec<AlarmError>) {
        if self.buzzer_out == Some(out) {
            return;
        }
        let res = match out {
            BuzzerOutput::Off => self.buzzer.stop(),
            BuzzerOutput::Tone(hz) => self.buzzer.tone(hz),
        };
        match res {
            Ok(()) => {
                tracing::trace!(?out, "buzzer");
                self.buzzer_out = Some(out);
            }
            Err(e) => {
                let err = map_collaborator_error(Boundary::Hardware, &*e);
                tracing::warn!(error = %err, "buzzer write failed");
                failures.push(err);
                self.buzzer_out = None;
            }
        }
    }

    fn drive_led(&mut self, on: bool, failures: &mut Vec<AlarmError>) {
        if self.led_out == Some(on) {
            return;
        }
        match self.led.set(on) {
            Ok(()) => self.led_out = Some(on),
            Err(e) => {
                let err = map_collaborator_error(Boundary::Hardware, &*e);
                tracing::warn!(error = %err, "led write failed");
                failures.push(err);
                self.led_out = None;
            }
        }
    }
}

/// Builder for `Node`. All collaborators and the device identity are
/// required; timing and schedule fall back to their defaults.
#[derive(Default)]
pub struct NodeBuilder {
    device: Option<DeviceCfg>,
    timing: Option<TimingCfg>,
    schedule: Option<ScheduleConfig>,
    sensor: Option<Box<dyn MotionSensor>>,
    buzzer: Option<Box<dyn Buzzer>>,
    led: Option<Box<dyn StatusLed>>,
    store: Option<Box<dyn RemoteStore>>,
    wall: Option<Box<dyn WallClock>>,
    clock: Option<Box<dyn Clock>>,
}

impl NodeBuilder {
    /// Take device, timing and initial schedule from a loaded config.
    pub fn with_config(mut self, cfg: &alarm_config::Config) -> Self {
        self.device = Some(DeviceCfg::from(&cfg.device));
        self.timing = Some(TimingCfg::from(&cfg.timing));
        self.schedule = Some(ScheduleConfig::from(&cfg.schedule));
        self
    }

    pub fn with_device(mut self, device: DeviceCfg) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Schedule used until the first successful refresh from the store.
    pub fn with_schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_sensor(mut self, sensor: impl MotionSensor + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn with_buzzer(mut self, buzzer: impl Buzzer + 'static) -> Self {
        self.buzzer = Some(Box::new(buzzer));
        self
    }

    pub fn with_led(mut self, led: impl StatusLed + 'static) -> Self {
        self.led = Some(Box::new(led));
        self
    }

    pub fn with_store(mut self, store: impl RemoteStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_wall_clock(mut self, wall: impl WallClock + 'static) -> Self {
        self.wall = Some(Box::new(wall));
        self
    }

    /// Monotonic clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn try_build(self) -> Result<Node> {
        let device = self.device.ok_or(BuildError::MissingDevice)?;
        if device.id.is_empty() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "device id must not be empty",
            )));
        }
        if device.pin.is_empty() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "device pin must not be empty",
            )));
        }
        let timing = self.timing.unwrap_or_default();
        if !(1..=1000).contains(&timing.cycle_ms) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "cycle_ms must be in [1, 1000]",
            )));
        }
        if timing.trigger_timeout_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "trigger_timeout_ms must be >= 1",
            )));
        }
        let schedule = self.schedule.unwrap_or_default();
        if schedule.start_hour > 23 || schedule.end_hour > 23 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "schedule hours must be in [0, 23]",
            )));
        }
        if schedule.start_minute > 59 || schedule.end_minute > 59 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "schedule minutes must be in [0, 59]",
            )));
        }

        let sensor = self.sensor.ok_or(BuildError::MissingSensor)?;
        let buzzer = self.buzzer.ok_or(BuildError::MissingBuzzer)?;
        let led = self.led.ok_or(BuildError::MissingLed)?;
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let wall = self.wall.ok_or(BuildError::MissingWallClock)?;
        let clock = self.clock.unwrap_or_else(|| Box::new(MonotonicClock::new()));
        let epoch = clock.now();

        Ok(Node {
            paths: Paths::new(&device.id),
            machine: AlarmMachine::new(device.pin, &timing),
            annunciator: Annunciator::new(),
            schedule,
            sensor,
            buzzer,
            led,
            store,
            wall,
            clock,
            epoch,
            announced: false,
            schedule_timer: Periodic::new(timing.schedule_refresh_ms),
            arm_poll_timer: Periodic::new(timing.arm_poll_ms),
            heartbeat_timer: Periodic::new(timing.heartbeat_ms),
            last_pir: false,
            buzzer_out: None,
            led_out: None,
            timing,
        })
    }
}
