//! Load cell access: the capability trait the calibration runs against,
//! the HX711 driver, and its Linux GPIO binding.

pub mod gpio;
mod hx711;
mod simulated;

use std::time::Duration;

use thiserror::Error;

use crate::config::{DEFAULT_CLOCK_PIN, DEFAULT_DATA_PIN, DEFAULT_GPIO_CHIP, DEFAULT_READY_TIMEOUT};

pub use hx711::{twos_complement_24, Gain, Hx711, Order, ReadingFormat};
pub use simulated::SimulatedLoadCell;

/// Sensor errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("GPIO error: {0}")]
    Gpio(String),
    #[error("HX711 not ready after {0:?}, check DOUT/SCK wiring and power")]
    Timeout(Duration),
    #[error("Reference unit must be finite and non-zero")]
    InvalidReferenceUnit,
    #[error("Number of readings to average must be at least 1")]
    InvalidAverageCount,
    #[error("Load cell has already been released")]
    Released,
}

/// Capabilities the calibration needs from a load cell.
///
/// Implemented by the HX711 driver and by [`SimulatedLoadCell`], so the
/// sampling and aggregation logic can run without hardware.
pub trait LoadCell {
    /// Set the divisor applied to offset-corrected readings.
    fn set_reference_unit(&mut self, reference_unit: f64) -> Result<(), SensorError>;

    /// Current reference unit.
    fn reference_unit(&self) -> f64;

    /// Power-cycle the amplifier.
    fn reset(&mut self) -> Result<(), SensorError>;

    /// Zero the scale with `times` averaged readings. Returns the new offset.
    fn tare(&mut self, times: usize) -> Result<f64, SensorError>;

    /// Read `times` averaged conversions, corrected by offset and reference unit.
    fn read_weight(&mut self, times: usize) -> Result<f64, SensorError>;

    /// Release the hardware. Further reads fail with [`SensorError::Released`].
    fn release(&mut self) -> Result<(), SensorError>;
}

impl<T: LoadCell + ?Sized> LoadCell for Box<T> {
    fn set_reference_unit(&mut self, reference_unit: f64) -> Result<(), SensorError> {
        (**self).set_reference_unit(reference_unit)
    }

    fn reference_unit(&self) -> f64 {
        (**self).reference_unit()
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        (**self).reset()
    }

    fn tare(&mut self, times: usize) -> Result<f64, SensorError> {
        (**self).tare(times)
    }

    fn read_weight(&mut self, times: usize) -> Result<f64, SensorError> {
        (**self).read_weight(times)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        (**self).release()
    }
}

/// Wiring and protocol settings for an HX711 on a Linux GPIO chip.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// GPIO character device, e.g. `/dev/gpiochip0`
    pub chip: String,
    /// Line offset wired to DOUT
    pub data_pin: u32,
    /// Line offset wired to PD_SCK
    pub clock_pin: u32,
    /// Channel and gain for conversions
    pub gain: Gain,
    /// Byte and bit order of the 24-bit result
    pub format: ReadingFormat,
    /// Upper bound on waiting for a conversion
    pub ready_timeout: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            chip: DEFAULT_GPIO_CHIP.to_string(),
            data_pin: DEFAULT_DATA_PIN,
            clock_pin: DEFAULT_CLOCK_PIN,
            gain: Gain::default(),
            format: ReadingFormat::default(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

impl SensorConfig {
    pub fn with_chip(mut self, chip: impl Into<String>) -> Self {
        self.chip = chip.into();
        self
    }

    /// Set the data (DOUT) and clock (PD_SCK) line offsets.
    pub fn with_pins(mut self, data_pin: u32, clock_pin: u32) -> Self {
        self.data_pin = data_pin;
        self.clock_pin = clock_pin;
        self
    }

    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_format(mut self, format: ReadingFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_config_defaults() {
        let config = SensorConfig::default();
        assert_eq!(config.chip, "/dev/gpiochip0");
        assert_eq!(config.data_pin, 17);
        assert_eq!(config.clock_pin, 27);
        assert_eq!(config.gain, Gain::A128);
        assert_eq!(config.format, ReadingFormat::new(Order::Msb, Order::Msb));
    }

    #[test]
    fn test_sensor_config_builders() {
        let config = SensorConfig::default()
            .with_chip("/dev/gpiochip4")
            .with_pins(5, 6)
            .with_gain(Gain::B32)
            .with_ready_timeout(Duration::from_millis(250));
        assert_eq!(config.chip, "/dev/gpiochip4");
        assert_eq!((config.data_pin, config.clock_pin), (5, 6));
        assert_eq!(config.gain, Gain::B32);
        assert_eq!(config.ready_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_boxed_load_cell_delegates() {
        let mut cell: Box<dyn LoadCell> = Box::new(SimulatedLoadCell::new(10.0));
        cell.set_reference_unit(2.0).unwrap();
        assert_eq!(cell.reference_unit(), 2.0);
        cell.release().unwrap();
        assert_eq!(cell.read_weight(1), Err(SensorError::Released));
    }
}
