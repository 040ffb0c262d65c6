//! Statistical helpers shared by the detectors.

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n).
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (divides by n - 1); 0 below two samples.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Gini coefficient of a value distribution, in [0, 1].
///
/// 0 means perfectly even, 1 means maximally concentrated. Computed from
/// the cumulative sums of the sorted values.
#[must_use]
pub fn gini_coefficient(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;

    let mut cumulative = 0.0;
    let mut cumulative_sum = 0.0;
    for v in &sorted {
        cumulative += v;
        cumulative_sum += cumulative;
    }
    if cumulative <= 0.0 {
        return 0.0;
    }
    (n + 1.0 - 2.0 * cumulative_sum / cumulative) / n
}

/// Percentile with linear interpolation between order statistics.
///
/// `p` is in [0, 100]. An empty slice yields 0.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((population_std(&values) - 2.0).abs() < 1e-12);
        assert!(sample_std(&values) > population_std(&values));
    }

    #[test]
    fn test_sample_std_degenerate() {
        assert_eq!(sample_std(&[5.0]), 0.0);
        assert_eq!(sample_std(&[]), 0.0);
    }

    #[test]
    fn test_gini_equal_distribution_is_zero() {
        let g = gini_coefficient(&[100.0, 100.0, 100.0]);
        assert!(g.abs() < 1e-12);
    }

    #[test]
    fn test_gini_concentrated_distribution() {
        let g = gini_coefficient(&[0.0, 0.0, 0.0, 0.0, 1000.0]);
        assert!(g > 0.75);
        let even = gini_coefficient(&[200.0, 200.0, 200.0, 200.0, 200.0]);
        assert!(g > even);
    }

    #[test]
    fn test_gini_empty() {
        assert_eq!(gini_coefficient(&[]), 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert!((percentile(&values, 95.0) - 3.85).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let values = [9.0, 1.0, 5.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
    }
}
