//! The arming / detection / annunciation state machine (`AlarmMachine`).
//!
//! `step()` is a pure function of the current state and one cycle's inputs:
//! it updates `AlarmState` and returns the side effects to execute. Steps run
//! in a fixed order and later steps see the state left by earlier ones:
//!
//! 1. schedule reconciliation
//! 2. remote `status/armed` reconciliation
//! 3. PIN-gated command
//! 4. motion processing (armed only)
//! 5. triggered timeout / siren tick
//! 6. disarmed cleanup

use alarm_traits::TimeOfDay;

use crate::config::{ScheduleConfig, TimingCfg};
use crate::detector::MotionDetector;
use crate::intent::{Alert, Intent, SoundCue, Source};
use crate::remote::RemoteCommand;
use crate::schedule::is_active;
use crate::state::{AlarmState, Mode};

/// Schedule config plus the wall-clock time it should be evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSample {
    pub config: ScheduleConfig,
    pub now: TimeOfDay,
}

/// Everything the machine needs to know about one control cycle.
///
/// `None` means "nothing new this cycle" (not due, not readable, or absent).
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    pub now_ms: u64,
    pub schedule: Option<ScheduleSample>,
    pub remote_armed: Option<bool>,
    pub command: Option<RemoteCommand>,
    pub motion: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AlarmMachine {
    state: AlarmState,
    detector: MotionDetector,
    pin: String,
    trigger_timeout_ms: u64,
}

impl AlarmMachine {
    pub fn new(pin: impl Into<String>, timing: &TimingCfg) -> Self {
        Self {
            state: AlarmState::default(),
            detector: MotionDetector::new(timing.debounce_ms),
            pin: pin.into(),
            trigger_timeout_ms: timing.trigger_timeout_ms,
        }
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    /// Run one control cycle and return the intents to execute, in order.
    pub fn step(&mut self, inputs: &CycleInputs) -> Vec<Intent> {
        let mut out = Vec::new();
        let now = inputs.now_ms;

        let scheduled = self.reconcile_schedule(inputs.schedule.as_ref(), &mut out);
        if !scheduled && let Some(remote) = inputs.remote_armed {
            self.reconcile_remote(remote, &mut out);
        }
        if let Some(cmd) = &inputs.command {
            self.apply_command(cmd, &mut out);
        }
        if self.state.armed()
            && let Some(level) = inputs.motion
        {
            self.process_motion(level, now, &mut out);
        }
        if self.state.triggered() {
            self.tick_trigger(now, &mut out);
        }
        if !self.state.armed() {
            out.push(Intent::Sound(SoundCue::Silence));
            out.push(Intent::Led(false));
            self.detector.reset_latch();
        }

        debug_assert!(self.state.invariant_holds(), "state invariant broken");
        out
    }

    /// Step 1. Returns true when the schedule changed the armed state.
    fn reconcile_schedule(&mut self, sample: Option<&ScheduleSample>, out: &mut Vec<Intent>) -> bool {
        let Some(sample) = sample else {
            return false;
        };
        if !sample.config.enabled {
            return false;
        }
        let active = is_active(&sample.config, sample.now.hour, sample.now.minute);
        tracing::debug!(
            now = %sample.now,
            window = %sample.config,
            active,
            "schedule evaluated"
        );
        match (active, self.state.armed()) {
            (true, false) => {
                self.arm(Source::Schedule, out);
                true
            }
            (false, true) => {
                self.disarm(Source::Schedule, out);
                true
            }
            _ => false,
        }
    }

    /// Step 2. Replays a flip of the remote armed flag made by someone else.
    fn reconcile_remote(&mut self, remote_armed: bool, out: &mut Vec<Intent>) {
        match (remote_armed, self.state.armed()) {
            (true, false) => self.arm(Source::RemotePoll, out),
            (false, true) => self.disarm(Source::RemotePoll, out),
            _ => {}
        }
    }

    /// Step 3. The command is consumed whatever the outcome.
    fn apply_command(&mut self, cmd: &RemoteCommand, out: &mut Vec<Intent>) {
        out.push(Intent::DeleteCommand);
        if cmd.pin != self.pin {
            tracing::warn!(action = cmd.action, "command rejected: incorrect PIN");
            out.push(Intent::Alert(Alert::IncorrectPin));
            return;
        }
        tracing::info!(action = cmd.action, "PIN verified");
        match (cmd.action, self.state.armed()) {
            (true, false) => self.arm(Source::PinCommand, out),
            (false, true) => self.disarm(Source::PinCommand, out),
            _ => tracing::debug!(armed = self.state.armed(), "command matches current state"),
        }
    }

    /// Step 4.
    fn process_motion(&mut self, level: bool, now: u64, out: &mut Vec<Intent>) {
        let Some(event) = self.detector.observe(level, now) else {
            return;
        };
        let new_episode = self.state.trigger(event.at_ms);
        if new_episode {
            tracing::warn!(at_ms = event.at_ms, "ALARM TRIGGERED: motion detected");
            out.push(Intent::Led(true));
        } else {
            tracing::info!(at_ms = event.at_ms, "motion detected during active trigger");
        }
        out.push(Intent::SetRemoteTriggered(true));
        out.push(Intent::Alert(Alert::MotionDetected));
        out.push(Intent::LogMotion { at_ms: event.at_ms });
    }

    /// Step 5.
    fn tick_trigger(&mut self, now: u64, out: &mut Vec<Intent>) {
        let Some(started) = self.state.triggered_at_ms() else {
            return;
        };
        let elapsed = now.saturating_sub(started);
        if elapsed > self.trigger_timeout_ms {
            tracing::info!(elapsed_ms = elapsed, "trigger timeout, siren stopped");
            self.state.end_episode();
            out.push(Intent::Sound(SoundCue::Silence));
            out.push(Intent::Led(false));
            out.push(Intent::SetRemoteTriggered(false));
        } else {
            out.push(Intent::Sound(SoundCue::Siren {
                elapsed_ms: elapsed,
            }));
        }
    }

    fn arm(&mut self, source: Source, out: &mut Vec<Intent>) {
        self.state.arm();
        tracing::info!(source = source.as_str(), "alarm armed");
        out.push(Intent::Sound(SoundCue::Chirp));
        // A flip observed on the remote flag is already reflected there.
        if source != Source::RemotePoll {
            out.push(Intent::SetRemoteArmed(true));
        }
        out.push(Intent::Alert(match source {
            Source::Schedule => Alert::AutoArmed,
            Source::RemotePoll => Alert::RemoteArmed,
            Source::PinCommand => Alert::PinArmed,
        }));
    }

    fn disarm(&mut self, source: Source, out: &mut Vec<Intent>) {
        let was_triggered = self.state.triggered();
        self.state.disarm();
        self.detector.reset_latch();
        tracing::info!(source = source.as_str(), was_triggered, "alarm disarmed");
        out.push(Intent::Sound(SoundCue::Silence));
        out.push(Intent::Led(false));
        out.push(Intent::SetRemoteTriggered(false));
        if source != Source::RemotePoll {
            out.push(Intent::SetRemoteArmed(false));
        }
        out.push(Intent::Alert(match source {
            Source::Schedule => Alert::AutoDisarmed,
            Source::RemotePoll => Alert::RemoteDisarmed,
            Source::PinCommand => Alert::PinDisarmed,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN: &str = "4321";

    fn machine() -> AlarmMachine {
        AlarmMachine::new(PIN, &TimingCfg::default())
    }

    fn at(now_ms: u64) -> CycleInputs {
        CycleInputs {
            now_ms,
            ..CycleInputs::default()
        }
    }

    fn cmd(pin: &str, action: bool) -> Option<RemoteCommand> {
        Some(RemoteCommand {
            pin: pin.to_string(),
            action,
        })
    }

    fn overnight(enabled: bool) -> ScheduleConfig {
        ScheduleConfig {
            enabled,
            ..ScheduleConfig::default()
        }
    }

    fn sample(hour: u8, minute: u8) -> Option<ScheduleSample> {
        Some(ScheduleSample {
            config: overnight(true),
            now: TimeOfDay::new(hour, minute).unwrap(),
        })
    }

    fn arm_via_pin(m: &mut AlarmMachine, now_ms: u64) {
        m.step(&CycleInputs {
            command: cmd(PIN, true),
            ..at(now_ms)
        });
        assert_eq!(m.mode(), Mode::ArmedIdle);
    }

    #[test]
    fn correct_pin_arms_with_chirp_and_remote_update() {
        let mut m = machine();
        let intents = m.step(&CycleInputs {
            command: cmd(PIN, true),
            ..at(0)
        });
        assert!(m.state().armed());
        assert_eq!(intents[0], Intent::DeleteCommand);
        assert!(intents.contains(&Intent::Sound(SoundCue::Chirp)));
        assert!(intents.contains(&Intent::SetRemoteArmed(true)));
        assert!(intents.contains(&Intent::Alert(Alert::PinArmed)));
    }

    #[test]
    fn wrong_pin_is_consumed_without_state_change() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        let intents = m.step(&CycleInputs {
            command: cmd("0000", false),
            ..at(100)
        });
        assert!(m.state().armed());
        assert_eq!(
            intents,
            vec![Intent::DeleteCommand, Intent::Alert(Alert::IncorrectPin)]
        );
    }

    #[test]
    fn pin_command_matching_state_is_noop_but_consumed() {
        let mut m = machine();
        let intents = m.step(&CycleInputs {
            command: cmd(PIN, false),
            ..at(0)
        });
        assert!(!m.state().armed());
        assert_eq!(intents[0], Intent::DeleteCommand);
        assert!(!intents.iter().any(|i| matches!(i, Intent::Alert(_))));
    }

    #[test]
    fn motion_triggers_then_times_out() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        let intents = m.step(&CycleInputs {
            motion: Some(true),
            ..at(1_000)
        });
        assert_eq!(m.mode(), Mode::ArmedTriggered);
        assert_eq!(m.state().triggered_at_ms(), Some(1_000));
        assert!(intents.contains(&Intent::Led(true)));
        assert!(intents.contains(&Intent::SetRemoteTriggered(true)));
        assert!(intents.contains(&Intent::Alert(Alert::MotionDetected)));
        assert!(intents.contains(&Intent::LogMotion { at_ms: 1_000 }));
        assert!(intents.contains(&Intent::Sound(SoundCue::Siren { elapsed_ms: 0 })));

        // exactly at the timeout the siren keeps going
        let intents = m.step(&CycleInputs {
            motion: Some(true),
            ..at(31_000)
        });
        assert_eq!(m.mode(), Mode::ArmedTriggered);
        assert!(intents.contains(&Intent::Sound(SoundCue::Siren { elapsed_ms: 30_000 })));

        let intents = m.step(&CycleInputs {
            motion: Some(true),
            ..at(31_001)
        });
        assert_eq!(m.mode(), Mode::ArmedIdle);
        assert_eq!(m.state().triggered_at_ms(), None);
        assert!(intents.contains(&Intent::Sound(SoundCue::Silence)));
        assert!(intents.contains(&Intent::Led(false)));
        assert!(intents.contains(&Intent::SetRemoteTriggered(false)));
    }

    #[test]
    fn motion_ignored_while_disarmed() {
        let mut m = machine();
        let intents = m.step(&CycleInputs {
            motion: Some(true),
            ..at(5_000)
        });
        assert_eq!(m.mode(), Mode::Disarmed);
        assert_eq!(
            intents,
            vec![Intent::Sound(SoundCue::Silence), Intent::Led(false)]
        );
        assert!(!m.detector().is_latched());
    }

    #[test]
    fn retrigger_does_not_extend_episode() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        m.step(&CycleInputs {
            motion: Some(true),
            ..at(1_000)
        });
        m.step(&CycleInputs {
            motion: Some(false),
            ..at(2_000)
        });
        let intents = m.step(&CycleInputs {
            motion: Some(true),
            ..at(4_000)
        });
        assert_eq!(m.state().triggered_at_ms(), Some(1_000));
        assert_eq!(m.state().last_motion_at_ms(), Some(4_000));
        assert!(!intents.contains(&Intent::Led(true)));
        assert!(intents.contains(&Intent::LogMotion { at_ms: 4_000 }));
    }

    #[test]
    fn schedule_arms_inside_window() {
        let mut m = machine();
        let intents = m.step(&CycleInputs {
            schedule: sample(23, 0),
            ..at(0)
        });
        assert!(m.state().armed());
        assert!(intents.contains(&Intent::Alert(Alert::AutoArmed)));
        assert!(intents.contains(&Intent::SetRemoteArmed(true)));
    }

    #[test]
    fn schedule_disarm_overrides_trigger() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        m.step(&CycleInputs {
            motion: Some(true),
            ..at(1_000)
        });
        assert!(m.state().triggered());
        let intents = m.step(&CycleInputs {
            schedule: sample(12, 0),
            motion: Some(true),
            ..at(1_500)
        });
        assert_eq!(m.mode(), Mode::Disarmed);
        assert!(intents.contains(&Intent::Alert(Alert::AutoDisarmed)));
        assert!(intents.contains(&Intent::SetRemoteArmed(false)));
        assert!(intents.contains(&Intent::SetRemoteTriggered(false)));
    }

    #[test]
    fn disabled_schedule_is_ignored() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        m.step(&CycleInputs {
            schedule: Some(ScheduleSample {
                config: overnight(false),
                now: TimeOfDay::new(12, 0).unwrap(),
            }),
            ..at(100)
        });
        assert!(m.state().armed());
    }

    #[test]
    fn remote_poll_flip_is_replayed() {
        let mut m = machine();
        let intents = m.step(&CycleInputs {
            remote_armed: Some(true),
            ..at(0)
        });
        assert!(m.state().armed());
        assert!(intents.contains(&Intent::Sound(SoundCue::Chirp)));
        assert!(intents.contains(&Intent::Alert(Alert::RemoteArmed)));
        assert!(!intents.contains(&Intent::SetRemoteArmed(true)));

        m.step(&CycleInputs {
            motion: Some(true),
            ..at(500)
        });
        let intents = m.step(&CycleInputs {
            remote_armed: Some(false),
            ..at(600)
        });
        assert_eq!(m.mode(), Mode::Disarmed);
        assert!(intents.contains(&Intent::SetRemoteTriggered(false)));
        assert!(intents.contains(&Intent::Alert(Alert::RemoteDisarmed)));
    }

    #[test]
    fn schedule_wins_over_stale_remote_poll_in_same_cycle() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        // remote still says armed (read before the schedule's write lands)
        let intents = m.step(&CycleInputs {
            schedule: sample(12, 0),
            remote_armed: Some(true),
            ..at(100)
        });
        assert_eq!(m.mode(), Mode::Disarmed);
        assert!(!intents.iter().any(|i| matches!(i, Intent::Alert(Alert::RemoteArmed))));
    }

    #[test]
    fn pin_disarm_clears_trigger_same_cycle() {
        let mut m = machine();
        arm_via_pin(&mut m, 0);
        m.step(&CycleInputs {
            motion: Some(true),
            ..at(3_000)
        });
        let intents = m.step(&CycleInputs {
            command: cmd(PIN, false),
            motion: Some(true),
            ..at(3_100)
        });
        assert!(!m.state().triggered());
        assert!(!m.state().armed());
        assert!(intents.contains(&Intent::Alert(Alert::PinDisarmed)));
        assert!(!intents.iter().any(|i| matches!(i, Intent::Sound(SoundCue::Siren { .. }))));
    }
}
