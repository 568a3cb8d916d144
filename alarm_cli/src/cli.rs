//! CLI argument definitions and shared statics.

use alarm_traits::TimeOfDay;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "alarm", version, about = "Intrusion alarm node")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/alarm.toml")]
    pub config: PathBuf,

    /// Log and report as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG takes precedence
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until Ctrl-C
    Run {
        /// JSON file standing in for the remote store (overrides [store] path)
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
        /// Stop after this many control cycles
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
    },
    /// Validate config and exercise buzzer and LED once
    SelfCheck,
    /// Evaluate the configured schedule window at a local time
    Schedule {
        /// Local time as HH:MM
        #[arg(long, value_name = "HH:MM", value_parser = parse_hhmm)]
        at: TimeOfDay,
    },
}

/// Parse `HH:MM` (24-hour) into a `TimeOfDay`.
pub fn parse_hhmm(s: &str) -> Result<TimeOfDay, String> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got {s:?}"))?;
    let hour: u8 = h.trim().parse().map_err(|_| format!("bad hour in {s:?}"))?;
    let minute: u8 = m.trim().parse().map_err(|_| format!("bad minute in {s:?}"))?;
    TimeOfDay::new(hour, minute).ok_or_else(|| format!("{s:?} is not a valid time of day"))
}
