//! Maps `Box<dyn Error>` from trait boundaries to typed `AlarmError`.
//!
//! The traits in `alarm_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `alarm_hardware::HwError`
//! downcasting.

use crate::error::AlarmError;

/// Which side of the node a failing collaborator sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Store,
    Hardware,
}

/// Map a trait-boundary error to a typed `AlarmError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_collaborator_error(
    boundary: Boundary,
    e: &(dyn std::error::Error + 'static),
) -> AlarmError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<alarm_hardware::error::HwError>() {
            return match hw {
                alarm_hardware::error::HwError::Gpio(msg) => {
                    AlarmError::HardwareFault(msg.clone())
                }
                other => AlarmError::Hardware(other.to_string()),
            };
        }
    }

    if let Some(io) = e.downcast_ref::<std::io::Error>() {
        return AlarmError::Io(io.to_string());
    }

    let s = e.to_string();
    match boundary {
        Boundary::Store if s.to_lowercase().contains("not ready") => AlarmError::StoreNotReady,
        Boundary::Store => AlarmError::Store(s),
        Boundary::Hardware => AlarmError::Hardware(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_kind() {
        let e = std::io::Error::other("disk gone");
        match map_collaborator_error(Boundary::Store, &e) {
            AlarmError::Io(msg) => assert!(msg.contains("disk gone")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn string_errors_map_by_boundary() {
        let e: Box<dyn std::error::Error + Send + Sync> = "service not ready".into();
        assert!(matches!(
            map_collaborator_error(Boundary::Store, &*e),
            AlarmError::StoreNotReady
        ));
        let e: Box<dyn std::error::Error + Send + Sync> = "pwm busy".into();
        assert!(matches!(
            map_collaborator_error(Boundary::Hardware, &*e),
            AlarmError::Hardware(_)
        ));
    }
}
