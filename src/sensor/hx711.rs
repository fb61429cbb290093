//! Bit-banged HX711 driver over `embedded-hal` digital pins.
//!
//! The HX711 signals a finished conversion by pulling DOUT low. The 24-bit
//! two's complement result is then shifted out on DOUT, one bit per PD_SCK
//! pulse, followed by 1 to 3 extra pulses that select channel and gain for
//! the next conversion. PD_SCK may stay high for at most 50 µs per pulse;
//! after 60 µs the chip powers down.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use serde::{Deserialize, Serialize};

use super::{LoadCell, SensorError};
use crate::config::{DEFAULT_READY_TIMEOUT, UNITY_REFERENCE_UNIT};
use crate::stats;

/// Poll interval while waiting for DOUT to go low.
const READY_POLL_US: u32 = 100;

/// PD_SCK high time that puts the chip to sleep (datasheet minimum is 60 µs).
const POWER_DOWN_US: u32 = 100;

/// Settling time after waking the chip.
const POWER_UP_US: u32 = 100;

/// Below this many conversions `read_average` uses the median.
const MEDIAN_BELOW: usize = 5;

/// Share of conversions trimmed from each end by `read_average`.
const AVERAGE_TRIM_RATIO: f64 = 0.2;

/// Bit or byte order of the conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    /// Most significant first
    #[default]
    Msb,
    /// Least significant first
    Lsb,
}

/// How the three bytes of a conversion are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadingFormat {
    pub byte_order: Order,
    pub bit_order: Order,
}

impl ReadingFormat {
    pub const fn new(byte_order: Order, bit_order: Order) -> Self {
        Self {
            byte_order,
            bit_order,
        }
    }
}

/// Input channel and gain, selected by the pulses after each conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gain {
    /// Channel A, gain 128
    #[default]
    A128,
    /// Channel A, gain 64
    A64,
    /// Channel B, gain 32
    B32,
}

impl Gain {
    /// Extra PD_SCK pulses after the 24 data bits.
    pub const fn pulses(self) -> u8 {
        match self {
            Gain::A128 => 1,
            Gain::A64 => 3,
            Gain::B32 => 2,
        }
    }
}

/// Decode a 24-bit two's complement value.
pub fn twos_complement_24(value: u32) -> i32 {
    -((value & 0x80_0000) as i32) + (value & 0x7F_FFFF) as i32
}

fn gpio_error<E: embedded_hal::digital::Error>(error: E) -> SensorError {
    SensorError::Gpio(format!("{:?}", error.kind()))
}

/// HX711 load cell amplifier.
///
/// The handle owns both lines. Dropping it without calling
/// [`LoadCell::release`] powers the chip down anyway.
pub struct Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    dout: DOUT,
    sck: SCK,
    delay: D,
    gain: Gain,
    format: ReadingFormat,
    offset: f64,
    reference_unit: f64,
    ready_timeout: Duration,
    released: bool,
}

impl<DOUT, SCK, D> Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the data and clock lines.
    ///
    /// Starts on channel A/128 with MSB/MSB format, no offset and a unity
    /// reference unit.
    pub fn new(dout: DOUT, sck: SCK, delay: D) -> Self {
        Self {
            dout,
            sck,
            delay,
            gain: Gain::A128,
            format: ReadingFormat::default(),
            offset: 0.0,
            reference_unit: UNITY_REFERENCE_UNIT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            released: false,
        }
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Select channel and gain. Takes effect after the next conversion.
    pub fn with_gain(mut self, gain: Gain) -> Self {
        self.gain = gain;
        self
    }

    /// Configure how conversion bytes and bits are ordered.
    pub fn set_reading_format(&mut self, byte_order: Order, bit_order: Order) {
        self.format = ReadingFormat::new(byte_order, bit_order);
    }

    pub fn reading_format(&self) -> ReadingFormat {
        self.format
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Offset subtracted from averaged readings, set by `tare`.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    /// A conversion is available when DOUT is low.
    pub fn is_ready(&mut self) -> Result<bool, SensorError> {
        self.dout.is_low().map_err(gpio_error)
    }

    fn ensure_active(&self) -> Result<(), SensorError> {
        if self.released {
            Err(SensorError::Released)
        } else {
            Ok(())
        }
    }

    fn wait_ready(&mut self) -> Result<(), SensorError> {
        let start = Instant::now();
        while !self.is_ready()? {
            if start.elapsed() >= self.ready_timeout {
                return Err(SensorError::Timeout(self.ready_timeout));
            }
            self.delay.delay_us(READY_POLL_US);
        }
        Ok(())
    }

    /// One PD_SCK pulse. Nothing may delay while the clock is high.
    fn read_next_bit(&mut self) -> Result<bool, SensorError> {
        self.sck.set_high().map_err(gpio_error)?;
        let bit = self.dout.is_high().map_err(gpio_error)?;
        self.sck.set_low().map_err(gpio_error)?;
        Ok(bit)
    }

    fn read_next_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0u8;
        for _ in 0..8 {
            let bit = self.read_next_bit()?;
            match self.format.bit_order {
                Order::Msb => {
                    byte <<= 1;
                    if bit {
                        byte |= 0x01;
                    }
                }
                Order::Lsb => {
                    byte >>= 1;
                    if bit {
                        byte |= 0x80;
                    }
                }
            }
        }
        Ok(byte)
    }

    /// Wait for and read one raw conversion.
    pub fn read_raw(&mut self) -> Result<i32, SensorError> {
        self.ensure_active()?;
        self.wait_ready()?;

        let first = self.read_next_byte()?;
        let second = self.read_next_byte()?;
        let third = self.read_next_byte()?;

        for _ in 0..self.gain.pulses() {
            self.read_next_bit()?;
        }

        let [high, mid, low] = match self.format.byte_order {
            Order::Msb => [first, second, third],
            Order::Lsb => [third, second, first],
        };
        let value = (high as u32) << 16 | (mid as u32) << 8 | low as u32;
        Ok(twos_complement_24(value))
    }

    /// Combine `times` raw conversions into one value.
    ///
    /// One conversion is returned as is, fewer than five use the median,
    /// more drop the lowest and highest 20% before averaging.
    pub fn read_average(&mut self, times: usize) -> Result<f64, SensorError> {
        if times == 0 {
            return Err(SensorError::InvalidAverageCount);
        }
        if times == 1 {
            return Ok(self.read_raw()? as f64);
        }

        let mut values = Vec::with_capacity(times);
        for _ in 0..times {
            values.push(self.read_raw()? as f64);
        }

        let combined = if times < MEDIAN_BELOW {
            stats::median(&values)
        } else {
            let trim = (times as f64 * AVERAGE_TRIM_RATIO) as usize;
            stats::trimmed_mean(&values, trim)
        };
        combined.ok_or(SensorError::InvalidAverageCount)
    }

    /// Offset-corrected average, not yet divided by the reference unit.
    pub fn read_value(&mut self, times: usize) -> Result<f64, SensorError> {
        Ok(self.read_average(times)? - self.offset)
    }

    /// Put the chip to sleep by holding PD_SCK high.
    pub fn power_down(&mut self) -> Result<(), SensorError> {
        self.sck.set_low().map_err(gpio_error)?;
        self.sck.set_high().map_err(gpio_error)?;
        self.delay.delay_us(POWER_DOWN_US);
        Ok(())
    }

    /// Wake the chip. It comes back on channel A/128, so any other gain
    /// needs one throwaway conversion to be applied.
    pub fn power_up(&mut self) -> Result<(), SensorError> {
        self.sck.set_low().map_err(gpio_error)?;
        self.delay.delay_us(POWER_UP_US);
        if self.gain != Gain::A128 {
            self.read_raw()?;
        }
        Ok(())
    }
}

impl<DOUT, SCK, D> LoadCell for Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    fn set_reference_unit(&mut self, reference_unit: f64) -> Result<(), SensorError> {
        if reference_unit == 0.0 || !reference_unit.is_finite() {
            return Err(SensorError::InvalidReferenceUnit);
        }
        self.reference_unit = reference_unit;
        Ok(())
    }

    fn reference_unit(&self) -> f64 {
        self.reference_unit
    }

    fn reset(&mut self) -> Result<(), SensorError> {
        self.ensure_active()?;
        self.power_down()?;
        self.power_up()?;
        tracing::debug!("HX711 reset");
        Ok(())
    }

    fn tare(&mut self, times: usize) -> Result<f64, SensorError> {
        let backup = self.reference_unit;
        self.reference_unit = UNITY_REFERENCE_UNIT;
        let result = self.read_average(times);
        self.reference_unit = backup;

        let offset = result?;
        self.offset = offset;
        tracing::info!("Tare complete, offset {:.1}", offset);
        Ok(offset)
    }

    fn read_weight(&mut self, times: usize) -> Result<f64, SensorError> {
        Ok(self.read_value(times)? / self.reference_unit)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        if self.released {
            return Ok(());
        }
        self.power_down()?;
        self.released = true;
        tracing::info!("HX711 powered down and released");
        Ok(())
    }
}

impl<DOUT, SCK, D> Drop for Hx711<DOUT, SCK, D>
where
    DOUT: InputPin,
    SCK: OutputPin,
    D: DelayNs,
{
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to power down HX711: {}", e);
        }
    }
}
