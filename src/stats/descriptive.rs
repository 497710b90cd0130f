//! Descriptive statistics over raw observations.

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Population variance (denominator `n`); 0 for an empty slice.
#[must_use]
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n
}

/// Sample standard deviation (denominator `n - 1`, or 1 for a single value).
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    #[allow(clippy::cast_precision_loss)]
    let denom = values.len().saturating_sub(1).max(1) as f64;
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / denom).sqrt()
}

/// Standard error `sqrt(variance / n)`; 0 when `n` is 0.
#[must_use]
pub fn standard_error(variance: f64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    (variance / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert!(mean(&[]).abs() < f64::EPSILON);
        assert!(population_variance(&[]).abs() < f64::EPSILON);
        assert!(sample_std_dev(&[]).abs() < f64::EPSILON);
        assert!(standard_error(1.0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_population_variance_uses_n() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&values) - 2.5).abs() < 1e-12);
        assert!((population_variance(&values) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev_uses_n_minus_one() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((sample_std_dev(&values) - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(sample_std_dev(&[7.0]).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_standard_error() {
        assert!(standard_error(0.0, 100).abs() < f64::EPSILON);
        assert!((standard_error(4.0, 100) - 0.2).abs() < 1e-12);
    }
}
