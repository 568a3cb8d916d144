//! Daily schedule window evaluation.

use crate::config::ScheduleConfig;

/// Whether `hour:minute` falls inside the configured window.
///
/// The window is `[start, end)` in minutes of day. When `start > end` it
/// crosses midnight. `start == end` never matches.
pub fn is_active(cfg: &ScheduleConfig, hour: u8, minute: u8) -> bool {
    if !cfg.enabled {
        return false;
    }
    let cur = u16::from(hour) * 60 + u16::from(minute);
    let start = cfg.start_minutes();
    let end = cfg.end_minutes();

    if start > end {
        cur >= start || cur < end
    } else {
        cur >= start && cur < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn window(sh: u8, sm: u8, eh: u8, em: u8) -> ScheduleConfig {
        ScheduleConfig {
            enabled: true,
            start_hour: sh,
            start_minute: sm,
            end_hour: eh,
            end_minute: em,
        }
    }

    #[rstest]
    #[case(23, 59, true)]
    #[case(0, 0, true)]
    #[case(5, 59, true)]
    #[case(6, 0, false)]
    #[case(12, 0, false)]
    #[case(22, 0, true)]
    #[case(21, 59, false)]
    fn overnight_window(#[case] h: u8, #[case] m: u8, #[case] expected: bool) {
        assert_eq!(is_active(&window(22, 0, 6, 0), h, m), expected);
    }

    #[rstest]
    #[case(8, 29, false)]
    #[case(8, 30, true)]
    #[case(18, 44, true)]
    #[case(18, 45, false)]
    fn daytime_window_end_is_exclusive(#[case] h: u8, #[case] m: u8, #[case] expected: bool) {
        assert_eq!(is_active(&window(8, 30, 18, 45), h, m), expected);
    }

    #[test]
    fn equal_bounds_never_active() {
        let cfg = window(8, 0, 8, 0);
        for h in 0..24 {
            for m in 0..60 {
                assert!(!is_active(&cfg, h, m), "{h:02}:{m:02} should be inactive");
            }
        }
    }

    #[test]
    fn disabled_is_never_active() {
        let cfg = ScheduleConfig {
            enabled: false,
            ..window(0, 0, 23, 59)
        };
        assert!(!is_active(&cfg, 12, 0));
    }
}
