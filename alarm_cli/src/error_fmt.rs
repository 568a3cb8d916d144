//! Human-readable error descriptions and structured JSON error formatting.

use alarm_core::error::{AlarmError, BuildError};
use alarm_hardware::error::HwError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/alarm.toml for a sample."
            ),
            other => format!(
                "What happened: The alarm node could not be assembled ({other}).\nLikely causes: A device failed to initialize before the node was built.\nHow to fix: Re-run with --log-level=debug to see which collaborator failed."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file is not valid TOML.\nDetails: {}\nHow to fix: Correct the syntax; [device] with id and pin is required.",
            te.message()
        );
    }

    if let Some(ae) = err.downcast_ref::<AlarmError>() {
        return match ae {
            AlarmError::Config(msg) => format!(
                "What happened: Invalid configuration: {msg}.\nHow to fix: Edit the config file, then rerun. See etc/alarm.toml for a sample."
            ),
            AlarmError::HardwareFault(msg) | AlarmError::Hardware(msg) => format!(
                "What happened: Hardware error: {msg}.\nLikely causes: Wrong [pins] values or missing GPIO permissions.\nHow to fix: Check wiring and the [pins] section; run with GPIO access."
            ),
            AlarmError::Io(msg) => format!(
                "What happened: I/O error: {msg}.\nHow to fix: Check that the store and log paths exist and are writable."
            ),
            other => format!(
                "What happened: {other}.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return match he {
            HwError::UnknownTimezone(tz) => format!(
                "What happened: Unknown timezone {tz:?}.\nHow to fix: Set [clock] timezone to an IANA name such as \"Europe/Sarajevo\"."
            ),
            HwError::Gpio(msg) => format!(
                "What happened: Failed to initialize GPIO ({msg}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO."
            ),
            other => format!("What happened: {other}.\nHow to fix: Check the hardware setup."),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Whether the error came from loading or validating configuration.
pub fn is_config_error(err: &eyre::Report) -> bool {
    err.downcast_ref::<toml::de::Error>().is_some()
        || matches!(err.downcast_ref::<AlarmError>(), Some(AlarmError::Config(_)))
        || matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        )
        || matches!(
            err.downcast_ref::<HwError>(),
            Some(HwError::UnknownTimezone(_))
        )
}

/// Config errors exit with 2, everything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if is_config_error(err) { 2 } else { 1 }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if is_config_error(err) {
        return "Config";
    }
    if let Some(ae) = err.downcast_ref::<AlarmError>() {
        return match ae {
            AlarmError::Store(_) | AlarmError::StoreNotReady => "Store",
            AlarmError::Hardware(_) | AlarmError::HardwareFault(_) => "Hardware",
            AlarmError::Io(_) => "Io",
            AlarmError::Config(_) => "Config",
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return "Hardware";
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
