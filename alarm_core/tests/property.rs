use alarm_core::{
    AlarmMachine, CycleInputs, MotionDetector, RemoteCommand, ScheduleConfig, ScheduleSample,
    TimingCfg, is_active,
};
use alarm_traits::TimeOfDay;
use proptest::prelude::*;

const PIN: &str = "2468";

#[derive(Debug, Clone)]
struct Tick {
    dt_ms: u64,
    motion: bool,
    remote: Option<bool>,
    command: Option<(bool, bool)>,
    schedule: Option<(bool, u8, u8)>,
}

prop_compose! {
    fn tick()(
        dt_ms in 1u64..3000,
        motion in any::<bool>(),
        remote in proptest::option::weighted(0.2, any::<bool>()),
        command in proptest::option::weighted(0.1, (any::<bool>(), any::<bool>())),
        schedule in proptest::option::weighted(0.1, (any::<bool>(), 0u8..24, 0u8..60)),
    ) -> Tick {
        Tick { dt_ms, motion, remote, command, schedule }
    }
}

fn inputs(now_ms: u64, t: &Tick) -> CycleInputs {
    CycleInputs {
        now_ms,
        schedule: t.schedule.map(|(enabled, hour, minute)| ScheduleSample {
            config: ScheduleConfig {
                enabled,
                ..ScheduleConfig::default()
            },
            now: TimeOfDay::new(hour, minute).unwrap(),
        }),
        remote_armed: t.remote,
        command: t.command.map(|(good, action)| RemoteCommand {
            pin: if good { PIN.to_string() } else { "0000".to_string() },
            action,
        }),
        motion: Some(t.motion),
    }
}

proptest! {
    #[test]
    fn detection_events_respect_debounce(
        samples in proptest::collection::vec((1u64..1500, any::<bool>()), 1..400)
    ) {
        let mut d = MotionDetector::new(2000);
        let mut now = 0u64;
        let mut last: Option<u64> = None;
        for (dt, level) in samples {
            now += dt;
            if let Some(ev) = d.observe(level, now) {
                if let Some(prev) = last {
                    prop_assert!(ev.at_ms - prev > 2000);
                }
                last = Some(ev.at_ms);
            }
        }
    }

    #[test]
    fn triggered_implies_armed_after_every_step(ticks in proptest::collection::vec(tick(), 1..300)) {
        let mut m = AlarmMachine::new(PIN, &TimingCfg::default());
        let mut now = 0u64;
        for t in &ticks {
            now += t.dt_ms;
            m.step(&inputs(now, t));
            let s = m.state();
            prop_assert!(!s.triggered() || s.armed());
            prop_assert_eq!(s.triggered(), s.triggered_at_ms().is_some());
        }
    }

    #[test]
    fn disarm_clears_trigger_in_same_cycle(ticks in proptest::collection::vec(tick(), 1..200)) {
        let mut m = AlarmMachine::new(PIN, &TimingCfg::default());
        let mut now = 0u64;
        for t in &ticks {
            now += t.dt_ms;
            let was_armed = m.state().armed();
            m.step(&inputs(now, t));
            if was_armed && !m.state().armed() {
                prop_assert!(!m.state().triggered());
            }
        }
    }

    #[test]
    fn trigger_never_outlives_timeout(ticks in proptest::collection::vec(tick(), 1..300)) {
        let timing = TimingCfg::default();
        let mut m = AlarmMachine::new(PIN, &timing);
        let mut now = 0u64;
        for t in &ticks {
            now += t.dt_ms;
            m.step(&inputs(now, t));
            if let Some(at) = m.state().triggered_at_ms() {
                prop_assert!(now - at <= timing.trigger_timeout_ms);
            }
        }
    }

    #[test]
    fn equal_bounds_window_is_never_active(h in 0u8..24, m in 0u8..60, ch in 0u8..24, cm in 0u8..60) {
        let cfg = ScheduleConfig {
            enabled: true,
            start_hour: h,
            start_minute: m,
            end_hour: h,
            end_minute: m,
        };
        prop_assert!(!is_active(&cfg, ch, cm));
    }
}
