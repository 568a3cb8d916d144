#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary `commands` payloads must parse or be rejected, never panic.
    let _ = alarm_core::parse_command(data);
});
