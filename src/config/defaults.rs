//! Compiled-in defaults for the hardware binding and the sampling run.

use std::time::Duration;

/// BCM number of the GPIO line wired to HX711 DOUT.
pub const DEFAULT_DATA_PIN: u32 = 17;

/// BCM number of the GPIO line wired to HX711 PD_SCK.
pub const DEFAULT_CLOCK_PIN: u32 = 27;

/// GPIO character device the pins belong to.
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by `gpioinfo` while the lines are held.
pub const GPIO_CONSUMER: &str = "hx711-calibrate";

/// Number of weight samples collected during calibration.
pub const DEFAULT_SAMPLE_COUNT: usize = 50;

/// Number of samples dropped from each end of the sorted set.
pub const DEFAULT_TRIM_COUNT: usize = 3;

/// Delay between two samples, lets the amplifier settle.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;

/// Conversions averaged by the driver for every sample.
pub const DEFAULT_READ_AVERAGES: usize = 1;

/// Conversions averaged when zeroing the scale.
pub const DEFAULT_TARE_TIMES: usize = 15;

/// How long to wait for DOUT to signal a finished conversion.
///
/// The HX711 converts at 10 or 80 SPS, so a healthy chip is ready well
/// within this window.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(1);

/// Reference unit the driver starts with. Raw counts pass through unchanged.
pub const UNITY_REFERENCE_UNIT: f64 = 1.0;
