use alarm_core::error::BuildError;
use alarm_core::mocks::{FixedWallClock, MemoryStore, RecordingBuzzer, RecordingLed, ScriptedSensor};
use alarm_core::{DeviceCfg, Node, NodeBuilder, TimingCfg};
use rstest::rstest;

fn device() -> DeviceCfg {
    DeviceCfg {
        id: "hall".into(),
        pin: "1234".into(),
    }
}

fn full() -> NodeBuilder {
    Node::builder()
        .with_device(device())
        .with_sensor(ScriptedSensor::new())
        .with_buzzer(RecordingBuzzer::new())
        .with_led(RecordingLed::new())
        .with_store(MemoryStore::new())
        .with_wall_clock(FixedWallClock::new())
}

#[rstest]
fn complete_builder_succeeds_with_default_clock() {
    let node = full().try_build().expect("builds");
    assert_eq!(node.paths().root(), "devices/hall");
    assert_eq!(node.timing(), &TimingCfg::default());
}

#[rstest]
fn missing_device_yields_typed_build_error() {
    let err = Node::builder()
        .with_sensor(ScriptedSensor::new())
        .try_build()
        .expect_err("should fail with MissingDevice");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingDevice) => {}
        other => panic!("expected MissingDevice, got: {other:?}"),
    }
}

#[rstest]
fn missing_store_yields_typed_build_error() {
    let err = Node::builder()
        .with_device(device())
        .with_sensor(ScriptedSensor::new())
        .with_buzzer(RecordingBuzzer::new())
        .with_led(RecordingLed::new())
        .with_wall_clock(FixedWallClock::new())
        .try_build()
        .expect_err("should fail with MissingStore");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingStore) => {}
        other => panic!("expected MissingStore, got: {other:?}"),
    }
}

#[rstest]
#[case(0)]
#[case(1001)]
fn cycle_period_out_of_range_is_rejected(#[case] cycle_ms: u64) {
    let err = full()
        .with_timing(TimingCfg {
            cycle_ms,
            ..TimingCfg::default()
        })
        .try_build()
        .expect_err("invalid cycle");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn empty_pin_is_rejected() {
    let err = full()
        .with_device(DeviceCfg {
            id: "hall".into(),
            pin: String::new(),
        })
        .try_build()
        .expect_err("empty pin");
    assert!(err.to_string().contains("pin"));
}

#[rstest]
fn builder_takes_values_from_loaded_config() {
    let cfg = alarm_config::load_toml(
        r#"
        [device]
        id = "porch"
        pin = "9999"

        [timing]
        cycle_ms = 50

        [schedule]
        enabled = true
        start_hour = 21
        "#,
    )
    .unwrap();
    let node = Node::builder()
        .with_config(&cfg)
        .with_sensor(ScriptedSensor::new())
        .with_buzzer(RecordingBuzzer::new())
        .with_led(RecordingLed::new())
        .with_store(MemoryStore::new())
        .with_wall_clock(FixedWallClock::new())
        .try_build()
        .unwrap();
    assert_eq!(node.paths().root(), "devices/porch");
    assert_eq!(node.timing().cycle_ms, 50);
    assert!(node.schedule().enabled);
    assert_eq!(node.schedule().start_hour, 21);
    assert_eq!(node.schedule().end_hour, 6);
}
