//! Operator console: the known-weight prompt and the result summary.
//!
//! Generic over `BufRead`/`Write` so the binary passes stdin/stdout and
//! tests pass in-memory buffers.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::calibration::CalibrationReport;
use crate::config::MESSAGES;

/// Prompt errors.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Console I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("No input, expected the known weight in grams")]
    EndOfInput,
    #[error("Known weight must be a whole number of grams, got {0:?}")]
    InvalidNumber(String),
}

/// Ask for the known weight and parse the answer as integer grams.
///
/// Range checks are left to the calibrator so that every caller gets the
/// same error for a non-positive weight.
pub fn read_known_weight<R, W>(input: &mut R, output: &mut W) -> Result<i64, PromptError>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{}", MESSAGES.weight_prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(PromptError::EndOfInput);
    }

    let answer = line.trim();
    answer
        .parse()
        .map_err(|_| PromptError::InvalidNumber(answer.to_string()))
}

/// Print one sample as it arrives, always with a decimal point.
pub fn print_sample<W: Write>(output: &mut W, index: usize, reading: f64) -> io::Result<()> {
    writeln!(output, "{}: {:?}", index, reading)
}

/// Print one sample during sampling. A failed write is logged and sampling
/// goes on; returns whether the line was written.
pub fn echo_sample<W: Write>(output: &mut W, index: usize, reading: f64) -> bool {
    match print_sample(output, index, reading) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to print sample {}: {}", index, e);
            false
        }
    }
}

/// Print the result block the operator copies from.
pub fn print_report<W: Write>(output: &mut W, report: &CalibrationReport) -> io::Result<()> {
    let (low, high) = report.trimmed_range();

    writeln!(output)?;
    writeln!(
        output,
        "Kept {} of {} samples (dropped {} from each end), range {:.1} .. {:.1}",
        report.trimmed.len(),
        report.samples.len(),
        report.trim_count,
        low,
        high
    )?;
    writeln!(output, "{}: {:.1}", MESSAGES.average_reading, report.average)?;
    writeln!(output, "{}: {:.2}", MESSAGES.reference_unit, report.reference_unit)?;
    writeln!(
        output,
        "Known weight: {} g, calibrated at {}",
        report.known_weight,
        report.completed_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(output)?;
    writeln!(output, "{}", MESSAGES.add_to_script)?;
    writeln!(output, "{}", report.snippet())?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationConfig, LoadCellCalibrator};
    use std::io::Cursor;

    fn prompt(answer: &str) -> (Result<i64, PromptError>, String) {
        let mut input = Cursor::new(answer.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = read_known_weight(&mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_read_known_weight() {
        let (result, shown) = prompt("  500 \n");
        assert_eq!(result.unwrap(), 500);
        assert_eq!(shown, MESSAGES.weight_prompt);
    }

    #[test]
    fn test_read_known_weight_keeps_sign() {
        let (result, _) = prompt("-20\n");
        assert_eq!(result.unwrap(), -20);
    }

    #[test]
    fn test_read_known_weight_rejects_non_integer() {
        let (result, _) = prompt("12.5\n");
        assert!(matches!(result, Err(PromptError::InvalidNumber(s)) if s == "12.5"));

        let (result, _) = prompt("\n");
        assert!(matches!(result, Err(PromptError::InvalidNumber(s)) if s.is_empty()));
    }

    #[test]
    fn test_read_known_weight_end_of_input() {
        let (result, _) = prompt("");
        assert!(matches!(result, Err(PromptError::EndOfInput)));
    }

    #[test]
    fn test_print_sample() {
        let mut output = Vec::new();
        print_sample(&mut output, 7, -12.5).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "7: -12.5\n");

        // Whole readings keep their decimal point
        let mut output = Vec::new();
        print_sample(&mut output, 0, 42000.0).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "0: 42000.0\n");
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_echo_sample_survives_write_failure() {
        let mut output = Vec::new();
        assert!(echo_sample(&mut output, 1, 3.0));
        assert_eq!(String::from_utf8(output).unwrap(), "1: 3.0\n");

        assert!(!echo_sample(&mut BrokenPipe, 2, 3.0));
    }

    #[test]
    fn test_print_report() {
        let calibrator = LoadCellCalibrator::new(CalibrationConfig::default());
        let report = calibrator.evaluate(vec![10.0; 10], 100).unwrap();

        let mut output = Vec::new();
        print_report(&mut output, &report).unwrap();
        let text = String::from_utf8(output).unwrap();

        assert!(text.contains("Kept 4 of 10 samples"));
        assert!(text.contains("Average reading: 10.0\n"));
        assert!(text.contains("Reference unit: 0.10\n"));
        assert!(text.contains("Add this to your script:\nhx.set_reference_unit(0.10)\n"));
    }
}
