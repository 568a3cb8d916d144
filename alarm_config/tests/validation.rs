use std::fs;

use alarm_config::{load_file, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[device]
id = "alarm_esp32_main"
pin = "1234"
"#;

fn with_section(extra: &str) -> String {
    format!("{BASE}\n{extra}")
}

#[rstest]
#[case("[timing]\ncycle_ms = 0", "timing.cycle_ms")]
#[case("[timing]\ncycle_ms = 5000", "timing.cycle_ms")]
#[case("[timing]\ndebounce_ms = 0", "timing.debounce_ms")]
#[case("[timing]\ntrigger_timeout_ms = 0", "timing.trigger_timeout_ms")]
#[case("[timing]\narm_poll_ms = 0", "timing.arm_poll_ms")]
#[case("[schedule]\nstart_hour = 24", "schedule hours")]
#[case("[schedule]\nend_minute = 60", "schedule minutes")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
#[case("[sim]\nmotion_period_ms = 1000\nmotion_high_ms = 1000", "sim.motion_high_ms")]
fn rejects_out_of_range_values(#[case] section: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_section(section)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error `{err}` should mention `{needle}`"
    );
}

#[rstest]
#[case("id = \"\"\npin = \"1234\"", "device.id")]
#[case("id = \"a/b\"\npin = \"1234\"", "device.id")]
#[case("id = \"node\"\npin = \"\"", "device.pin")]
#[case("id = \"node\"\npin = \"12 34\"", "device.pin")]
fn rejects_bad_device_identity(#[case] body: &str, #[case] needle: &str) {
    let cfg = load_toml(&format!("[device]\n{body}\n")).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle));
}

#[test]
fn accepts_full_config() {
    let toml = with_section(
        r#"
[pins]
pir = 17
buzzer = 18
led = 27

[timing]
cycle_ms = 50
debounce_ms = 1500
trigger_timeout_ms = 20000
arm_poll_ms = 1000
schedule_refresh_ms = 5000
heartbeat_ms = 15000

[schedule]
enabled = true
start_hour = 8
start_minute = 30
end_hour = 18
end_minute = 45

[clock]
timezone = "UTC"

[store]
path = "/tmp/store.json"

[logging]
level = "debug"
rotation = "daily"

[sim]
motion_period_ms = 10000
motion_high_ms = 300
"#,
    );
    let cfg = load_toml(&toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(cfg.schedule.enabled);
    assert_eq!(cfg.timing.cycle_ms, 50);
    assert_eq!(cfg.store.path.to_str(), Some("/tmp/store.json"));
}

#[test]
fn load_file_parses_and_validates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.toml");
    fs::write(&good, BASE).expect("write");
    let cfg = load_file(&good).expect("load");
    assert_eq!(cfg.device.id, "alarm_esp32_main");

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, with_section("[timing]\ndebounce_ms = 0")).expect("write");
    let err = load_file(&bad).expect_err("invalid config");
    assert!(format!("{err}").contains("debounce_ms"));

    let missing = dir.path().join("missing.toml");
    let err = load_file(&missing).expect_err("missing file");
    assert!(format!("{err}").contains("read config"));
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/alarm.toml");
    let cfg = load_file(&path).expect("etc/alarm.toml loads");
    assert_eq!(cfg.device.id, "alarm_esp32_main");
    assert_eq!(cfg.clock.timezone, "Europe/Sarajevo");
}
