//! Load cell simulation for dry runs and tests.

use super::{LoadCell, SensorError};
use crate::config::UNITY_REFERENCE_UNIT;

/// A linear load cell with a deterministic noise pattern.
///
/// Raw counts are `zero_counts + load * counts_per_gram + noise[i]`, with the
/// noise pattern repeated cyclically. `tare` always measures the empty
/// platform, as if the weight were placed after zeroing.
#[derive(Debug, Clone)]
pub struct SimulatedLoadCell {
    counts_per_gram: f64,
    zero_counts: f64,
    load_grams: f64,
    noise: Vec<f64>,
    cursor: usize,
    offset: f64,
    reference_unit: f64,
    released: bool,
    fail_after: Option<usize>,
    reads: usize,
}

impl SimulatedLoadCell {
    /// Create an unloaded cell with the given sensitivity.
    pub fn new(counts_per_gram: f64) -> Self {
        Self {
            counts_per_gram,
            zero_counts: 0.0,
            load_grams: 0.0,
            noise: Vec::new(),
            cursor: 0,
            offset: 0.0,
            reference_unit: UNITY_REFERENCE_UNIT,
            released: false,
            fail_after: None,
            reads: 0,
        }
    }

    /// Raw counts with nothing on the platform.
    pub fn with_zero_counts(mut self, zero_counts: f64) -> Self {
        self.zero_counts = zero_counts;
        self
    }

    /// Mass resting on the platform while sampling.
    pub fn with_load(mut self, grams: f64) -> Self {
        self.load_grams = grams;
        self
    }

    /// Noise added to successive conversions, in raw counts.
    pub fn with_noise(mut self, noise: impl Into<Vec<f64>>) -> Self {
        self.noise = noise.into();
        self
    }

    /// Fail every conversion after the first `reads`.
    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    /// Conversions performed so far, tare included.
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn next_noise(&mut self) -> f64 {
        if self.noise.is_empty() {
            return 0.0;
        }
        let value = self.noise[self.cursor % self.noise.len()];
        self.cursor += 1;
        value
    }

    fn convert(&mut self, load_grams: f64) -> Result<f64, SensorError> {
        if self.released {
            return Err(SensorError::Released);
        }
        if self.fail_after.is_some_and(|limit| self.reads >= limit) {
            return Err(SensorError::Gpio("simulated read failure".to_string()));
        }
        self.reads += 1;
        Ok(self.zero_counts + load_grams * self.counts_per_gram + self.next_noise())
    }

    fn average(&mut self, times: usize, load_grams: f64) -> Result<f64, SensorError> {
        if times == 0 {
            return Err(SensorError::InvalidAverageCount);
        }
        let mut sum = 0.0;
        for _ in 0..times {
            sum += self.convert(load_grams)?;
        }
        Ok(sum / times as f64)
    }
}

impl LoadCell for SimulatedLoadCell {
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
        if self.released {
            return Err(SensorError::Released);
        }
        self.offset = 0.0;
        Ok(())
    }

    fn tare(&mut self, times: usize) -> Result<f64, SensorError> {
        self.offset = self.average(times, 0.0)?;
        Ok(self.offset)
    }

    fn read_weight(&mut self, times: usize) -> Result<f64, SensorError> {
        let load = self.load_grams;
        Ok((self.average(times, load)? - self.offset) / self.reference_unit)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tare_ignores_load() {
        let mut cell = SimulatedLoadCell::new(420.0)
            .with_zero_counts(8_000.0)
            .with_load(100.0);

        assert_eq!(cell.tare(15).unwrap(), 8_000.0);
        assert_eq!(cell.read_weight(1).unwrap(), 42_000.0);
        assert_eq!(cell.reads(), 16);
    }

    #[test]
    fn test_noise_pattern_repeats() {
        let mut cell = SimulatedLoadCell::new(1.0).with_noise([1.0, -1.0]);

        let readings: Vec<f64> = (0..4).map(|_| cell.read_weight(1).unwrap()).collect();
        assert_eq!(readings, vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_reference_unit_scales_weight() {
        let mut cell = SimulatedLoadCell::new(420.0).with_load(10.0);
        cell.set_reference_unit(420.0).unwrap();
        assert_eq!(cell.read_weight(1).unwrap(), 10.0);
        assert_eq!(cell.set_reference_unit(0.0), Err(SensorError::InvalidReferenceUnit));
    }

    #[test]
    fn test_failure_injection() {
        let mut cell = SimulatedLoadCell::new(1.0).failing_after(2);
        assert!(cell.read_weight(1).is_ok());
        assert!(cell.read_weight(1).is_ok());
        assert!(matches!(cell.read_weight(1), Err(SensorError::Gpio(_))));
    }

    #[test]
    fn test_release() {
        let mut cell = SimulatedLoadCell::new(1.0);
        cell.release().unwrap();
        assert!(cell.is_released());
        assert_eq!(cell.tare(1), Err(SensorError::Released));
    }
}
