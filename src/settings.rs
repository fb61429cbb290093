//! Persistent hardware and sampling settings.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.
//!
//! Only the wiring and the sampling parameters live here. The reference
//! unit is printed for the operator and never written to disk.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calibration::CalibrationConfig;
use crate::config::{
    DEFAULT_CLOCK_PIN, DEFAULT_DATA_PIN, DEFAULT_GPIO_CHIP, DEFAULT_READY_TIMEOUT,
    DEFAULT_READ_AVERAGES, DEFAULT_SAMPLE_COUNT, DEFAULT_SETTLE_DELAY_MS, DEFAULT_TARE_TIMES,
    DEFAULT_TRIM_COUNT,
};
use crate::sensor::{Gain, Order, ReadingFormat, SensorConfig};

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// GPIO character device
    pub gpio_chip: String,
    /// Line offset wired to HX711 DOUT
    pub data_pin: u32,
    /// Line offset wired to HX711 PD_SCK
    pub clock_pin: u32,
    /// Channel and gain ("a128", "a64" or "b32")
    pub gain: Gain,
    /// Byte order of conversions ("msb" or "lsb")
    pub byte_order: Order,
    /// Bit order of conversions ("msb" or "lsb")
    pub bit_order: Order,
    /// Maximum wait for a conversion in milliseconds
    pub ready_timeout_ms: u64,
    /// Number of samples per calibration
    pub sample_count: usize,
    /// Samples trimmed from each end
    pub trim_count: usize,
    /// Delay between samples in milliseconds
    pub settle_delay_ms: u64,
    /// Conversions averaged per sample
    pub read_averages: usize,
    /// Conversions averaged by tare
    pub tare_times: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            gpio_chip: DEFAULT_GPIO_CHIP.to_string(),
            data_pin: DEFAULT_DATA_PIN,
            clock_pin: DEFAULT_CLOCK_PIN,
            gain: Gain::A128,
            byte_order: Order::Msb,
            bit_order: Order::Msb,
            ready_timeout_ms: DEFAULT_READY_TIMEOUT.as_millis() as u64,
            sample_count: DEFAULT_SAMPLE_COUNT,
            trim_count: DEFAULT_TRIM_COUNT,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            read_averages: DEFAULT_READ_AVERAGES,
            tare_times: DEFAULT_TARE_TIMES,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "hx711", "hx711-calibrate")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let defaults = Self::default();

        let mut loaded: Self = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Zero counts would make every run fail, treat them as unset
        if loaded.gpio_chip.is_empty() {
            loaded.gpio_chip = defaults.gpio_chip;
        }
        if loaded.sample_count == 0 {
            loaded.sample_count = defaults.sample_count;
        }
        if loaded.read_averages == 0 {
            loaded.read_averages = defaults.read_averages;
        }
        if loaded.tare_times == 0 {
            loaded.tare_times = defaults.tare_times;
        }
        if loaded.ready_timeout_ms == 0 {
            loaded.ready_timeout_ms = defaults.ready_timeout_ms;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path().ok_or("Cannot determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Override settings from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    /// Override settings from `lookup`. Unparsable values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|s| s.trim().parse().ok())
        }

        if let Some(chip) = lookup("HX711_GPIO_CHIP").filter(|s| !s.is_empty()) {
            self.gpio_chip = chip;
        }
        if let Some(pin) = parsed(lookup("HX711_DATA_PIN")) {
            self.data_pin = pin;
        }
        if let Some(pin) = parsed(lookup("HX711_CLOCK_PIN")) {
            self.clock_pin = pin;
        }
        if let Some(times) = parsed::<usize>(lookup("HX711_TARE_TIMES")).filter(|&n| n > 0) {
            self.tare_times = times;
        }
        if let Some(count) = parsed::<usize>(lookup("CALIBRATION_SAMPLES")).filter(|&n| n > 0) {
            self.sample_count = count;
        }
        if let Some(trim) = parsed(lookup("CALIBRATION_TRIM")) {
            self.trim_count = trim;
        }
        if let Some(delay) = parsed(lookup("CALIBRATION_DELAY_MS")) {
            self.settle_delay_ms = delay;
        }
    }

    /// Hardware configuration for opening the sensor.
    pub fn sensor_config(&self) -> SensorConfig {
        SensorConfig::default()
            .with_chip(&self.gpio_chip)
            .with_pins(self.data_pin, self.clock_pin)
            .with_gain(self.gain)
            .with_format(ReadingFormat::new(self.byte_order, self.bit_order))
            .with_ready_timeout(Duration::from_millis(self.ready_timeout_ms))
    }

    /// Sampling configuration for the calibrator.
    pub fn calibration_config(&self) -> CalibrationConfig {
        CalibrationConfig::default()
            .with_sample_count(self.sample_count)
            .with_trim_count(self.trim_count)
            .with_settle_delay(Duration::from_millis(self.settle_delay_ms))
            .with_read_averages(self.read_averages)
            .with_tare_times(self.tare_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scratch_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("hx711-calibrate-test-{}", std::process::id()))
            .join(name)
            .join("settings.json")
    }

    #[test]
    fn test_defaults_match_wiring() {
        let settings = AppSettings::default();
        assert_eq!(settings.data_pin, 17);
        assert_eq!(settings.clock_pin, 27);
        assert_eq!(settings.sample_count, 50);
        assert_eq!(settings.trim_count, 3);
        assert_eq!(settings.settle_delay_ms, 200);
        assert_eq!(settings.calibration_config(), CalibrationConfig::default());
        assert_eq!(settings.sensor_config(), SensorConfig::default());
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HX711_DATA_PIN", "5"),
            ("HX711_CLOCK_PIN", " 6 "),
            ("HX711_GPIO_CHIP", "/dev/gpiochip4"),
            ("CALIBRATION_SAMPLES", "20"),
            ("CALIBRATION_TRIM", "2"),
            ("CALIBRATION_DELAY_MS", "not-a-number"),
            ("HX711_TARE_TIMES", "0"),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        settings.apply_env_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.data_pin, 5);
        assert_eq!(settings.clock_pin, 6);
        assert_eq!(settings.gpio_chip, "/dev/gpiochip4");
        assert_eq!(settings.sample_count, 20);
        assert_eq!(settings.trim_count, 2);
        assert_eq!(settings.settle_delay_ms, 200);
        assert_eq!(settings.tare_times, 15);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = scratch_path("round-trip");
        let settings = AppSettings {
            data_pin: 23,
            clock_pin: 24,
            bit_order: Order::Lsb,
            gain: Gain::A64,
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"gain\": \"a64\""));
        assert_eq!(AppSettings::load_from(&path), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_backfills_partial_file() {
        let path = scratch_path("partial");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "data_pin": 4, "sample_count": 0 }"#).unwrap();

        let loaded = AppSettings::load_from(&path);
        assert_eq!(loaded.data_pin, 4);
        assert_eq!(loaded.clock_pin, 27);
        assert_eq!(loaded.sample_count, 50);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let loaded = AppSettings::load_from(&scratch_path("missing"));
        assert_eq!(loaded, AppSettings::default());
    }
}
