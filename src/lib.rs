// Copyright 2025 The hx711-calibrate Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # HX711 Calibrate
//!
//! Reference unit calibration for HX711 load cell amplifiers.
//!
//! The reference unit is the number of raw ADC counts per gram. It is found
//! by zeroing the empty scale, placing a known weight on it, sampling the
//! amplifier, dropping the extreme samples and dividing the average by the
//! known weight. The result is printed for pasting into the measurement
//! script.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hx711_calibrate::sensor::{gpio, LoadCell, SensorConfig};
//! use hx711_calibrate::{CalibrationConfig, LoadCellCalibrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut hx711 = gpio::open(&SensorConfig::default())?;
//!     let calibrator = LoadCellCalibrator::new(CalibrationConfig::default());
//!
//!     calibrator.prepare(&mut hx711)?;
//!     // place a 500 g weight on the scale
//!     let report = calibrator
//!         .calibrate(&mut hx711, 500, |i, value| println!("{}: {}", i, value))
//!         .await?;
//!     hx711.release()?;
//!
//!     println!("{}", report.snippet());
//!     Ok(())
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod console;
pub mod sensor;
pub mod settings;
pub mod stats;

pub use calibration::{
    CalibrationConfig, CalibrationError, CalibrationReport, LoadCellCalibrator,
};
pub use console::PromptError;
pub use sensor::{
    Gain, Hx711, LoadCell, Order, ReadingFormat, SensorConfig, SensorError, SimulatedLoadCell,
};
pub use settings::AppSettings;
