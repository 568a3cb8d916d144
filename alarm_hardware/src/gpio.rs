//! rppal-backed PIR input, buzzer and LED outputs.

use alarm_traits::{Buzzer, MotionSensor, StatusLed};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::{HwError, Result};

/// Duty cycle of the square wave driving a passive buzzer.
const BUZZER_DUTY: f64 = 0.5;

fn output(gpio: &Gpio, pin: u8) -> Result<OutputPin> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_output_low())
}

pub struct GpioPir {
    pin: InputPin,
}

impl GpioPir {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
            .into_input_pulldown();
        Ok(Self { pin })
    }
}

impl MotionSensor for GpioPir {
    fn read(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.pin.is_high())
    }
}

/// Passive buzzer driven with software PWM.
pub struct GpioBuzzer {
    pin: OutputPin,
    hz: Option<u32>,
}

impl GpioBuzzer {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: output(gpio, pin)?,
            hz: None,
        })
    }
}

impl Buzzer for GpioBuzzer {
    fn tone(&mut self, hz: u32) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.hz == Some(hz) {
            return Ok(());
        }
        self.pin
            .set_pwm_frequency(f64::from(hz), BUZZER_DUTY)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        tracing::trace!(hz, "buzzer pwm");
        self.hz = Some(hz);
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin
            .clear_pwm()
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        self.pin.set_low();
        self.hz = None;
        Ok(())
    }
}

pub struct GpioLed {
    pin: OutputPin,
}

impl GpioLed {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: output(gpio, pin)?,
        })
    }
}

impl StatusLed for GpioLed {
    fn set(&mut self, on: bool) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Open the GPIO controller.
pub fn open() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))
}
