//! Load cell calibration: sampling, outlier trimming and the reference unit.

mod aggregate;
mod calibrator;

pub use aggregate::{reference_unit, trim_outliers, trimmed_average, validate_known_weight};
pub use calibrator::{CalibrationConfig, CalibrationError, CalibrationReport, LoadCellCalibrator};
