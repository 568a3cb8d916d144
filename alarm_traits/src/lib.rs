//! Collaborator traits consumed by the alarm control core.
//!
//! Every method returns a boxed error so backends (GPIO, simulation, remote
//! stores) can surface their own error types; `alarm_core` maps them to a
//! typed error at the boundary.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock, TimeOfDay, WallClock};

/// Raw motion line (PIR output). `true` means the line is high.
pub trait MotionSensor {
    fn read(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Tone-capable buzzer channel.
pub trait Buzzer {
    fn tone(&mut self, hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Single status LED.
pub trait StatusLed {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Path-addressed remote key-value store.
///
/// Getters return `Ok(None)` when the node does not exist. `get_json` returns
/// the raw JSON text of the node; parsing is left to the caller.
pub trait RemoteStore {
    /// Whether the service is connected and authenticated.
    fn is_ready(&self) -> bool;

    fn get_bool(
        &mut self,
        path: &str,
    ) -> Result<Option<bool>, Box<dyn std::error::Error + Send + Sync>>;
    fn get_int(
        &mut self,
        path: &str,
    ) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>>;
    fn get_string(
        &mut self,
        path: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
    fn get_json(
        &mut self,
        path: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;

    fn set_bool(
        &mut self,
        path: &str,
        value: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_int(
        &mut self,
        path: &str,
        value: i64,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_string(
        &mut self,
        path: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    fn delete_node(&mut self, path: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MotionSensor + ?Sized> MotionSensor for Box<T> {
    fn read(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: Buzzer + ?Sized> Buzzer for Box<T> {
    fn tone(&mut self, hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).tone(hz)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

impl<T: StatusLed + ?Sized> StatusLed for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set(on)
    }
}
