//! Outlier trimming, averaging and the reference unit calculation.

use super::CalibrationError;
use crate::stats;

/// Sort `samples` and drop `trim` values from each end.
///
/// Fails with [`CalibrationError::InsufficientSamples`] when no more than
/// `2 * trim` samples are given, and with
/// [`CalibrationError::NonFiniteSample`] on NaN or infinite readings.
pub fn trim_outliers(samples: &[f64], trim: usize) -> Result<Vec<f64>, CalibrationError> {
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(CalibrationError::NonFiniteSample { index, value });
    }

    let sorted = stats::sorted(samples);
    stats::trim(&sorted, trim)
        .map(<[f64]>::to_vec)
        .ok_or(CalibrationError::InsufficientSamples {
            count: samples.len(),
            trim,
        })
}

/// Trimmed samples and their arithmetic mean.
pub fn trimmed_average(samples: &[f64], trim: usize) -> Result<(Vec<f64>, f64), CalibrationError> {
    let trimmed = trim_outliers(samples, trim)?;
    let average = stats::mean(&trimmed).ok_or(CalibrationError::InsufficientSamples {
        count: samples.len(),
        trim,
    })?;
    Ok((trimmed, average))
}

/// Reject known weights that cannot serve as a divisor.
pub fn validate_known_weight(known_weight: i64) -> Result<(), CalibrationError> {
    if known_weight <= 0 {
        return Err(CalibrationError::InvalidKnownWeight(known_weight));
    }
    Ok(())
}

/// Raw counts per gram: `average / known_weight`.
pub fn reference_unit(average: f64, known_weight: i64) -> Result<f64, CalibrationError> {
    validate_known_weight(known_weight)?;
    Ok(average / known_weight as f64)
}
