//! Order statistics over raw readings.
//!
//! Shared by the driver's multi-conversion averaging and the calibration
//! aggregator. All functions use a total order on `f64`, so NaN sorts last
//! instead of poisoning the comparison.

/// Copy of `values` sorted ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Drop `count` values from each end of an already sorted slice.
///
/// Returns `None` when nothing would remain.
pub fn trim(sorted: &[f64], count: usize) -> Option<&[f64]> {
    if sorted.len() <= count.saturating_mul(2) {
        return None;
    }
    Some(&sorted[count..sorted.len() - count])
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Mean after sorting and dropping `count` values from each end.
pub fn trimmed_mean(values: &[f64], count: usize) -> Option<f64> {
    let sorted = sorted(values);
    trim(&sorted, count).and_then(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_ascending() {
        assert_eq!(sorted(&[3.0, -1.0, 2.5, 0.0]), vec![-1.0, 0.0, 2.5, 3.0]);
    }

    #[test]
    fn test_trim_bounds() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_eq!(trim(&values, 3), Some(&[4.0][..]));
        assert_eq!(trim(&values, 0), Some(&values[..]));
        assert_eq!(trim(&values[..6], 3), None);
        assert_eq!(trim(&[], 0), None);
        assert_eq!(trim(&values, usize::MAX), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 10.0, 10.0, 10.0]), Some(10.0));
        assert_eq!(mean(&[1.0, 2.0]), Some(1.5));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_trimmed_mean_drops_outliers() {
        let values = [100.0, 101.0, 99.0, 100.0, 5000.0, -4000.0, 100.0];
        assert_eq!(trimmed_mean(&values, 1), Some(100.0));
        assert_eq!(trimmed_mean(&values[..2], 1), None);
    }
}
