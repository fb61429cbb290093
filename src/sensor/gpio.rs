//! HX711 on Linux GPIO character devices (Raspberry Pi and similar boards).

use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};

use super::{Hx711, SensorConfig, SensorError};
use crate::config::GPIO_CONSUMER;

/// HX711 driver bound to two Linux GPIO lines.
pub type GpioHx711 = Hx711<CdevPin, CdevPin, Delay>;

/// Open the GPIO chip, claim DOUT as input and PD_SCK as output (driven
/// low), and configure the driver from `config`.
///
/// The lines stay claimed until the returned handle is dropped.
pub fn open(config: &SensorConfig) -> Result<GpioHx711, SensorError> {
    let mut chip = Chip::new(&config.chip)
        .map_err(|e| SensorError::Gpio(format!("Failed to open {}: {}", config.chip, e)))?;

    let dout = request_line(&mut chip, config.data_pin, LineRequestFlags::INPUT)?;
    let sck = request_line(&mut chip, config.clock_pin, LineRequestFlags::OUTPUT)?;

    tracing::info!(
        "Opened HX711 on {} (DAT={}, CLK={})",
        config.chip,
        config.data_pin,
        config.clock_pin
    );

    let mut hx711 = Hx711::new(dout, sck, Delay)
        .with_gain(config.gain)
        .with_ready_timeout(config.ready_timeout);
    hx711.set_reading_format(config.format.byte_order, config.format.bit_order);
    Ok(hx711)
}

fn request_line(
    chip: &mut Chip,
    offset: u32,
    flags: LineRequestFlags,
) -> Result<CdevPin, SensorError> {
    let handle = chip
        .get_line(offset)
        .and_then(|line| line.request(flags, 0, GPIO_CONSUMER))
        .map_err(|e| SensorError::Gpio(format!("Failed to request line {}: {}", offset, e)))?;

    CdevPin::new(handle)
        .map_err(|e| SensorError::Gpio(format!("Failed to configure line {}: {}", offset, e)))
}
