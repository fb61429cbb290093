//! HX711 Calibrate - reference unit calibration for load cells
//!
//! This is the CLI entry point for the hx711-calibrate tool.
//! Run with: cargo run --bin hx711-calibrate

use anyhow::{anyhow, bail, Context};
use hx711_calibrate::config::MESSAGES;
use hx711_calibrate::console::{echo_sample, print_report, read_known_weight};
use hx711_calibrate::sensor::{gpio, LoadCell, SimulatedLoadCell};
use hx711_calibrate::calibration::validate_known_weight;
use hx711_calibrate::{AppSettings, CalibrationConfig, LoadCellCalibrator};
use std::env;
use std::io::{self, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Raw counts per gram of the simulated load cell.
const SIM_COUNTS_PER_GRAM: f64 = 420.0;

/// Mass resting on the simulated platform.
const SIM_LOAD_GRAMS: f64 = 100.0;

/// Raw counts of the empty simulated platform.
const SIM_ZERO_COUNTS: f64 = 8_388.0;

const USAGE: &str = "\
Usage: hx711-calibrate [OPTIONS]

Place a known weight on the scale when asked. The tool samples the HX711,
drops the extreme samples and prints the reference unit for your script.

Options:
  --weight <grams>        Known weight, skips the prompt
  --samples <n>           Samples to collect (default 50)
  --trim <n>              Samples dropped from each end (default 3)
  --delay-ms <ms>         Pause between samples (default 200)
  --data-pin <n>          GPIO line wired to DOUT (default 17)
  --clock-pin <n>         GPIO line wired to PD_SCK (default 27)
  --chip <path>           GPIO character device (default /dev/gpiochip0)
  --simulate              Use a simulated load cell instead of hardware
  --sim-load <grams>      Mass on the simulated platform (default 100)
  --save-settings         Store the effective settings for next time
  -h, --help              Show this help

Environment: HX711_DATA_PIN, HX711_CLOCK_PIN, HX711_GPIO_CHIP,
HX711_TARE_TIMES, CALIBRATION_SAMPLES, CALIBRATION_TRIM,
CALIBRATION_DELAY_MS, RUST_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    // Initialize tracing, quiet by default so the console stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    // Settings file, then environment, then flags
    let mut settings = AppSettings::load();
    settings.apply_env();

    if let Some(chip) = flag_value::<String>(&args, "--chip")? {
        settings.gpio_chip = chip;
    }
    if let Some(pin) = flag_value(&args, "--data-pin")? {
        settings.data_pin = pin;
    }
    if let Some(pin) = flag_value(&args, "--clock-pin")? {
        settings.clock_pin = pin;
    }
    if let Some(count) = flag_value(&args, "--samples")? {
        settings.sample_count = count;
    }
    if let Some(trim) = flag_value(&args, "--trim")? {
        settings.trim_count = trim;
    }
    if let Some(delay) = flag_value(&args, "--delay-ms")? {
        settings.settle_delay_ms = delay;
    }

    let simulate = args.iter().any(|arg| arg == "--simulate");
    let sim_load: f64 = flag_value(&args, "--sim-load")?.unwrap_or(SIM_LOAD_GRAMS);
    let known_weight: Option<i64> = flag_value(&args, "--weight")?;

    if args.iter().any(|arg| arg == "--save-settings") {
        let path = settings.save().map_err(|e| anyhow!(e))?;
        println!("Settings saved to {}", path.display());
    }

    let calibration_config = settings.calibration_config();
    check_inputs(&calibration_config, known_weight)?;

    println!("{}", MESSAGES.banner);
    println!("================================================");
    if simulate {
        println!("{}", MESSAGES.simulated);
    } else {
        println!(
            "Sensor: {} (DAT={}, CLK={})",
            settings.gpio_chip, settings.data_pin, settings.clock_pin
        );
    }
    println!(
        "Samples: {}, trim {} from each end, {}ms apart",
        calibration_config.sample_count,
        calibration_config.trim_count,
        calibration_config.settle_delay.as_millis()
    );
    println!("================================================\n");

    // Dropping the sensor on any early return powers the HX711 down
    let mut sensor: Box<dyn LoadCell> = if simulate {
        Box::new(
            SimulatedLoadCell::new(SIM_COUNTS_PER_GRAM)
                .with_zero_counts(SIM_ZERO_COUNTS)
                .with_load(sim_load)
                .with_noise([0.0, 35.0, -20.0, 12.0, -41.0, 3.0, 2_600.0, -8.0, 19.0, -2_900.0]),
        )
    } else {
        let sensor_config = settings.sensor_config();
        Box::new(gpio::open(&sensor_config).with_context(|| {
            format!(
                "Failed to open HX711 on {} (DAT={}, CLK={})",
                sensor_config.chip, sensor_config.data_pin, sensor_config.clock_pin
            )
        })?)
    };

    let calibrator = LoadCellCalibrator::new(calibration_config);
    let offset = calibrator
        .prepare(&mut sensor)
        .context("Failed to reset and tare the load cell")?;
    tracing::info!("Scale zeroed at offset {:.1}", offset);

    let known_weight = match known_weight {
        Some(weight) => weight,
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            read_known_weight(&mut input, &mut io::stdout())?
        }
    };

    println!("{}", MESSAGES.collecting);
    let outcome = tokio::select! {
        result = calibrator.calibrate(&mut sensor, known_weight, |i, reading| {
            echo_sample(&mut io::stdout(), i, reading);
        }) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(result) = outcome else {
        println!("\n{}", MESSAGES.interrupted);
        sensor.release().context("Failed to release the load cell")?;
        bail!("Calibration interrupted");
    };

    let report = result.context("Calibration failed")?;
    sensor.release().context("Failed to release the load cell")?;

    let mut stdout = io::stdout();
    print_report(&mut stdout, &report)?;
    stdout.flush()?;

    Ok(())
}

/// Reject bad sampling settings and a bad `--weight` before touching the
/// hardware.
fn check_inputs(config: &CalibrationConfig, known_weight: Option<i64>) -> anyhow::Result<()> {
    config.validate().context("Invalid sampling configuration")?;
    if let Some(weight) = known_weight {
        validate_known_weight(weight).context("Invalid --weight")?;
    }
    Ok(())
}

/// Value following `name` on the command line, parsed as `T`.
fn flag_value<T>(args: &[String], name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(position) = args.iter().position(|arg| arg == name) else {
        return Ok(None);
    };
    let raw = args
        .get(position + 1)
        .ok_or_else(|| anyhow!("{} needs a value", name))?;
    raw.parse()
        .map(Some)
        .map_err(|e| anyhow!("Invalid value {:?} for {}: {}", raw, name, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hx711_calibrate::CalibrationError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_check_inputs_rejects_bad_weight_flag() {
        let config = CalibrationConfig::default();

        assert!(check_inputs(&config, None).is_ok());
        assert!(check_inputs(&config, Some(500)).is_ok());

        for weight in [0, -20] {
            let error = check_inputs(&config, Some(weight)).unwrap_err();
            assert_eq!(
                error.downcast_ref::<CalibrationError>(),
                Some(&CalibrationError::InvalidKnownWeight(weight))
            );
        }
    }

    #[test]
    fn test_check_inputs_rejects_over_trimmed_config() {
        let config = CalibrationConfig::default()
            .with_sample_count(6)
            .with_trim_count(3);

        assert!(check_inputs(&config, Some(500)).is_err());
    }

    #[test]
    fn test_flag_value() {
        let list = args(&["--weight", "250", "--samples"]);

        assert_eq!(flag_value::<i64>(&list, "--weight").unwrap(), Some(250));
        assert_eq!(flag_value::<usize>(&list, "--trim").unwrap(), None);
        assert!(flag_value::<usize>(&list, "--samples").is_err());
        assert!(flag_value::<i64>(&args(&["--weight", "abc"]), "--weight").is_err());
    }
}
