//! Reference unit calibration for HX711 load cells.
//!
//! The operator zeroes the empty scale, places a known weight on it and
//! the calibrator samples the amplifier at a fixed cadence. The sorted
//! samples lose their extremes, the rest is averaged and divided by the
//! known weight. The resulting reference unit converts raw counts to grams
//! in the measurement script.

use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::time::sleep;

use super::aggregate::{reference_unit, trimmed_average, validate_known_weight};
use crate::config::{
    reference_unit_snippet, DEFAULT_READ_AVERAGES, DEFAULT_SAMPLE_COUNT, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_TARE_TIMES, DEFAULT_TRIM_COUNT, UNITY_REFERENCE_UNIT,
};
use crate::sensor::{LoadCell, SensorError};

/// Calibration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Insufficient samples: {count} collected, {trim} are trimmed from each end")]
    InsufficientSamples { count: usize, trim: usize },
    #[error("Invalid known weight: {0} g, must be a positive number of grams")]
    InvalidKnownWeight(i64),
    #[error("Sample {index} is not a finite number: {value}")]
    NonFiniteSample { index: usize, value: f64 },
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
}

/// Configuration for the calibration run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Number of weight samples to collect
    pub sample_count: usize,
    /// Samples dropped from each end of the sorted set
    pub trim_count: usize,
    /// Pause between two samples
    pub settle_delay: Duration,
    /// Conversions the driver averages per sample
    pub read_averages: usize,
    /// Conversions averaged when zeroing the scale
    pub tare_times: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            trim_count: DEFAULT_TRIM_COUNT,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            read_averages: DEFAULT_READ_AVERAGES,
            tare_times: DEFAULT_TARE_TIMES,
        }
    }
}

impl CalibrationConfig {
    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_trim_count(mut self, trim_count: usize) -> Self {
        self.trim_count = trim_count;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_read_averages(mut self, read_averages: usize) -> Self {
        self.read_averages = read_averages;
        self
    }

    pub fn with_tare_times(mut self, tare_times: usize) -> Self {
        self.tare_times = tare_times;
        self
    }

    /// Check that the configured trim leaves at least one sample.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.sample_count <= self.trim_count.saturating_mul(2) {
            return Err(CalibrationError::InsufficientSamples {
                count: self.sample_count,
                trim: self.trim_count,
            });
        }
        Ok(())
    }
}

/// Result of a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    /// Mass placed on the scale, in grams
    pub known_weight: i64,
    /// Samples in acquisition order
    pub samples: Vec<f64>,
    /// Sorted samples that survived trimming
    pub trimmed: Vec<f64>,
    /// Samples dropped from each end
    pub trim_count: usize,
    /// Mean of the trimmed samples
    pub average: f64,
    /// `average / known_weight`
    pub reference_unit: f64,
    /// When the calculation finished
    pub completed_at: DateTime<Local>,
}

impl CalibrationReport {
    /// Line to paste into the measurement script.
    pub fn snippet(&self) -> String {
        reference_unit_snippet(self.reference_unit)
    }

    /// Smallest and largest trimmed sample.
    pub fn trimmed_range(&self) -> (f64, f64) {
        // Trimmed samples are sorted and never empty
        (self.trimmed[0], self.trimmed[self.trimmed.len() - 1])
    }
}

/// Load cell calibrator.
pub struct LoadCellCalibrator {
    config: CalibrationConfig,
}

impl LoadCellCalibrator {
    /// Create a new calibrator with the given configuration.
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Bring the sensor to a known state: unity reference unit, power
    /// cycled, zeroed with the platform empty. Returns the tare offset.
    pub fn prepare<S: LoadCell + ?Sized>(&self, sensor: &mut S) -> Result<f64, CalibrationError> {
        sensor.set_reference_unit(UNITY_REFERENCE_UNIT)?;
        sensor.reset()?;
        let offset = sensor.tare(self.config.tare_times)?;
        Ok(offset)
    }

    /// Read `sample_count` weights, pausing `settle_delay` between reads.
    ///
    /// `on_sample` gets the 1-based index and value of every sample as it
    /// arrives.
    pub async fn collect_samples<S, F>(
        &self,
        sensor: &mut S,
        mut on_sample: F,
    ) -> Result<Vec<f64>, CalibrationError>
    where
        S: LoadCell + ?Sized,
        F: FnMut(usize, f64),
    {
        let count = self.config.sample_count;
        tracing::info!(
            "Collecting {} samples, {:?} apart",
            count,
            self.config.settle_delay
        );

        let mut samples = Vec::with_capacity(count);
        for i in 0..count {
            let reading = sensor.read_weight(self.config.read_averages)?;
            tracing::debug!("Sample {}/{}: {}", i + 1, count, reading);
            samples.push(reading);
            on_sample(i + 1, reading);

            if i + 1 < count && !self.config.settle_delay.is_zero() {
                sleep(self.config.settle_delay).await;
            }
        }

        Ok(samples)
    }

    /// Trim, average and divide collected samples by the known weight.
    pub fn evaluate(
        &self,
        samples: Vec<f64>,
        known_weight: i64,
    ) -> Result<CalibrationReport, CalibrationError> {
        validate_known_weight(known_weight)?;
        let (trimmed, average) = trimmed_average(&samples, self.config.trim_count)?;
        let reference_unit = reference_unit(average, known_weight)?;

        tracing::info!(
            "Average {:.1} over {} trimmed samples, reference unit {:.4}",
            average,
            trimmed.len(),
            reference_unit
        );

        Ok(CalibrationReport {
            known_weight,
            samples,
            trimmed,
            trim_count: self.config.trim_count,
            average,
            reference_unit,
            completed_at: Local::now(),
        })
    }

    /// Sample the loaded scale and compute the reference unit.
    ///
    /// The known weight and the trim configuration are checked before the
    /// first read.
    pub async fn calibrate<S, F>(
        &self,
        sensor: &mut S,
        known_weight: i64,
        on_sample: F,
    ) -> Result<CalibrationReport, CalibrationError>
    where
        S: LoadCell + ?Sized,
        F: FnMut(usize, f64),
    {
        validate_known_weight(known_weight)?;
        self.config.validate()?;

        let samples = self.collect_samples(sensor, on_sample).await?;
        self.evaluate(samples, known_weight)
    }
}
