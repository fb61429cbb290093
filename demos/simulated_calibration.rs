//! Calibrate a simulated load cell end to end.
//!
//! Run with: cargo run --example simulated_calibration

use std::time::Duration;

use hx711_calibrate::console::{echo_sample, print_report};
use hx711_calibrate::{CalibrationConfig, LoadCell, LoadCellCalibrator, SimulatedLoadCell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    // A 5 kg bar load cell reads roughly -420 counts per gram on channel A/128
    let mut cell = SimulatedLoadCell::new(-421.3)
        .with_zero_counts(-61_250.0)
        .with_load(250.0)
        .with_noise([0.0, 48.0, -31.0, 5.0, 4_900.0, -12.0, 27.0, -5_300.0]);

    // Shorter run than the defaults, same trimming
    let config = CalibrationConfig::default()
        .with_sample_count(20)
        .with_settle_delay(Duration::from_millis(20));
    let calibrator = LoadCellCalibrator::new(config);

    println!("⚖️  Simulated calibration with a 250 g weight\n");
    calibrator.prepare(&mut cell)?;

    let mut stdout = std::io::stdout();
    let report = calibrator
        .calibrate(&mut cell, 250, |i, reading| {
            echo_sample(&mut std::io::stdout(), i, reading);
        })
        .await?;
    cell.release()?;

    print_report(&mut stdout, &report)?;
    Ok(())
}
