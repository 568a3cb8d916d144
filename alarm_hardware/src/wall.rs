//! Wall-clock source for the schedule window and motion log timestamps.

use alarm_traits::{TimeOfDay, WallClock};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{HwError, Result};

/// System time before this instant (2021-01-01T00:00:00Z) is treated as
/// "never synchronized", e.g. a board that booted without NTP.
pub const MIN_SYNCED_UNIX: i64 = 1_609_459_200;

/// System clock viewed through an IANA timezone (DST aware).
#[derive(Debug, Clone, Copy)]
pub struct ZonedWallClock {
    tz: Tz,
}

impl ZonedWallClock {
    pub fn new(timezone: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| HwError::UnknownTimezone(timezone.to_string()))?;
        Ok(Self { tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local hour/minute for a UTC instant, or `None` if it predates sync.
    pub fn time_of_day_at(&self, utc: DateTime<Utc>) -> Option<TimeOfDay> {
        if utc.timestamp() < MIN_SYNCED_UNIX {
            return None;
        }
        let local = utc.with_timezone(&self.tz);
        let hour = u8::try_from(local.hour()).ok()?;
        let minute = u8::try_from(local.minute()).ok()?;
        TimeOfDay::new(hour, minute)
    }
}

impl WallClock for ZonedWallClock {
    fn time_of_day(&self) -> Option<TimeOfDay> {
        self.time_of_day_at(Utc::now())
    }

    fn unix_seconds(&self) -> Option<i64> {
        let secs = Utc::now().timestamp();
        (secs >= MIN_SYNCED_UNIX).then_some(secs)
    }
}
