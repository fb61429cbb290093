//! Configuration module for the calibration utility.

mod defaults;
mod messages;

pub use defaults::{
    DEFAULT_CLOCK_PIN, DEFAULT_DATA_PIN, DEFAULT_GPIO_CHIP, DEFAULT_READ_AVERAGES,
    DEFAULT_READY_TIMEOUT, DEFAULT_SAMPLE_COUNT, DEFAULT_SETTLE_DELAY_MS, DEFAULT_TARE_TIMES,
    DEFAULT_TRIM_COUNT, GPIO_CONSUMER, UNITY_REFERENCE_UNIT,
};
pub use messages::{reference_unit_snippet, Messages, MESSAGES};
