//! Operator-facing console messages.

/// Console messages shown during a calibration run.
#[derive(Debug, Clone)]
pub struct Messages {
    pub banner: &'static str,
    pub weight_prompt: &'static str,
    pub collecting: &'static str,
    pub average_reading: &'static str,
    pub reference_unit: &'static str,
    pub add_to_script: &'static str,
    pub interrupted: &'static str,
    pub simulated: &'static str,
}

/// English messages
pub static MESSAGES: Messages = Messages {
    banner: "⚖️  HX711 Load Cell Calibration",
    weight_prompt: "Place known weight on scale and enter its weight in grams: ",
    collecting: "Collecting samples...",
    average_reading: "Average reading",
    reference_unit: "Reference unit",
    add_to_script: "Add this to your script:",
    interrupted: "Interrupted, releasing the load cell",
    simulated: "Using simulated load cell (no hardware access)",
};

/// Line the operator pastes into the measurement script.
pub fn reference_unit_snippet(reference_unit: f64) -> String {
    format!("hx.set_reference_unit({:.2})", reference_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_unit_snippet() {
        assert_eq!(reference_unit_snippet(0.1), "hx.set_reference_unit(0.10)");
        assert_eq!(
            reference_unit_snippet(-421.456),
            "hx.set_reference_unit(-421.46)"
        );
    }

    #[test]
    fn test_prompt_mentions_grams() {
        assert!(MESSAGES.weight_prompt.contains("grams"));
    }
}
