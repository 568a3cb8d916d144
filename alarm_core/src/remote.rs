//! Remote store layout and payload parsing.
//!
//! All paths are scoped under `devices/<device id>/`.

use alarm_traits::RemoteStore;
use serde::Deserialize;
use serde::de::Deserializer;

use crate::config::ScheduleConfig;
use crate::error::AlarmError;
use crate::hw_error::{Boundary, map_collaborator_error};

/// A pending arm/disarm request written by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCommand {
    #[serde(deserialize_with = "de_pin")]
    pub pin: String,
    pub action: bool,
}

/// Accepts the PIN either as a JSON string or as a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum PinJson {
    Text(String),
    Number(u64),
}

fn de_pin<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PinJson::deserialize(deserializer)? {
        PinJson::Text(s) => s,
        PinJson::Number(n) => n.to_string(),
    })
}

/// Parse the JSON text of the `commands` node.
pub fn parse_command(json: &str) -> Result<RemoteCommand, serde_json::Error> {
    serde_json::from_str(json)
}

/// Device-scoped remote paths.
#[derive(Debug, Clone)]
pub struct Paths {
    root: String,
}

impl Paths {
    pub fn new(device_id: &str) -> Self {
        Self {
            root: format!("devices/{device_id}"),
        }
    }

    /// `devices/<device id>`.
    pub fn root(&self) -> &str {
        &self.root
    }

    fn at(&self, rel: &str) -> String {
        format!("{}/{rel}", self.root)
    }

    pub fn armed(&self) -> String {
        self.at("status/armed")
    }
    pub fn triggered(&self) -> String {
        self.at("status/triggered")
    }
    pub fn pir(&self) -> String {
        self.at("sensor/pir")
    }
    pub fn commands(&self) -> String {
        self.at("commands")
    }
    pub fn last_alert(&self) -> String {
        self.at("alerts/last")
    }
    pub fn motion_log(&self, unix_seconds: i64) -> String {
        self.at(&format!("motionLogs/{unix_seconds}"))
    }
    pub fn last_motion(&self) -> String {
        self.at("lastMotion")
    }
    pub fn schedule(&self, field: &str) -> String {
        self.at(&format!("schedule/{field}"))
    }
}

/// Re-read the schedule from the store.
///
/// All five fields are read before a new config is built, so the caller's copy
/// is replaced in one go. A field that is absent, unreadable or out of range
/// keeps its value from `prev`. Read failures are returned for logging.
pub fn fetch_schedule(
    store: &mut dyn RemoteStore,
    paths: &Paths,
    prev: &ScheduleConfig,
) -> (ScheduleConfig, Vec<AlarmError>) {
    let mut errors = Vec::new();

    let enabled = match store.get_bool(&paths.schedule("enabled")) {
        Ok(v) => v.unwrap_or(prev.enabled),
        Err(e) => {
            errors.push(map_collaborator_error(Boundary::Store, &*e));
            prev.enabled
        }
    };
    let mut int_field = |field: &str, max: u8, fallback: u8| -> u8 {
        match store.get_int(&paths.schedule(field)) {
            Ok(Some(v)) => match u8::try_from(v) {
                Ok(v) if v <= max => v,
                _ => {
                    tracing::warn!(field, value = v, "schedule field out of range, keeping previous");
                    fallback
                }
            },
            Ok(None) => fallback,
            Err(e) => {
                errors.push(map_collaborator_error(Boundary::Store, &*e));
                fallback
            }
        }
    };
    let start_hour = int_field("startHour", 23, prev.start_hour);
    let start_minute = int_field("startMinute", 59, prev.start_minute);
    let end_hour = int_field("endHour", 23, prev.end_hour);
    let end_minute = int_field("endMinute", 59, prev.end_minute);

    (
        ScheduleConfig {
            enabled,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        },
        errors,
    )
}
