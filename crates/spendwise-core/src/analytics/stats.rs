//! Statistics primitives shared by the analytics engines
//!
//! All functions are total: empty input, constant input and degenerate
//! regressions return 0 (or an exact fit) instead of NaN.

use serde::Serialize;

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N); 0 for an empty slice
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Distance from the mean in standard deviations; 0 when the cohort has no spread
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Coefficient of variation in percent (stdDev / mean * 100); 0 when mean <= 0
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m <= 0.0 {
        return 0.0;
    }
    std_dev(values, m) / m * 100.0
}

/// Least-squares slope of `values` against their indices 0..n-1
///
/// Returns 0 for fewer than two points or a zero denominator.
pub fn linear_trend(values: &[f64]) -> f64 {
    linear_regression(values).slope
}

/// Ordinary least-squares fit of `values` against indices 0..n-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to [0, 1]
    pub r_squared: f64,
}

impl LinearFit {
    /// Predicted value at index `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `(i, values[i])`
///
/// - n == 0: everything 0
/// - n == 1: flat line through the single point, R² = 1
/// - constant series: slope 0, R² = 1 (the fit is exact)
pub fn linear_regression(values: &[f64]) -> LinearFit {
    let n = values.len();
    if n == 0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
    }

    let n_f = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n_f * sum_xx - sum_x * sum_x;
    let slope = if n < 2 || denominator == 0.0 {
        0.0
    } else {
        (n_f * sum_xy - sum_x * sum_y) / denominator
    };
    let slope = if slope.is_finite() { slope } else { 0.0 };
    let intercept = (sum_y - slope * sum_x) / n_f;

    let y_mean = sum_y / n_f;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let predicted = slope * i as f64 + intercept;
        ss_res += (y - predicted).powi(2);
        ss_tot += (y - y_mean).powi(2);
    }

    let r_squared = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        assert_eq!(std_dev(&values, m), 2.0);
        assert_eq!(std_dev(&[], 0.0), 0.0);
    }

    #[test]
    fn test_z_score_zero_spread() {
        assert_eq!(z_score(100.0, 100.0, 0.0), 0.0);
        assert_eq!(z_score(9.0, 5.0, 2.0), 2.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[100.0, 100.0]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
        // mean 100, stdDev 50
        assert!((coefficient_of_variation(&[50.0, 150.0]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_basic_and_degenerate() {
        assert_eq!(linear_trend(&[100.0, 200.0, 300.0]), 100.0);
        assert_eq!(linear_trend(&[]), 0.0);
        assert_eq!(linear_trend(&[42.0]), 0.0);
        assert_eq!(linear_trend(&[5.0, 5.0, 5.0]), 0.0);
        assert!(linear_trend(&[300.0, 200.0, 100.0]) < 0.0);
    }

    #[test]
    fn test_regression_perfect_fit() {
        let fit = linear_regression(&[100.0, 200.0, 300.0]);
        assert_eq!(fit.slope, 100.0);
        assert_eq!(fit.intercept, 100.0);
        assert_eq!(fit.r_squared, 1.0);
        assert_eq!(fit.predict(3.0), 400.0);
    }

    #[test]
    fn test_regression_constant_series_is_exact() {
        let fit = linear_regression(&[50.0, 50.0, 50.0, 50.0]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 1.0);
        assert_eq!(fit.predict(10.0), 50.0);
    }

    #[test]
    fn test_regression_noisy_r_squared_in_range() {
        let fit = linear_regression(&[10.0, 80.0, 20.0, 90.0, 15.0]);
        assert!(fit.r_squared >= 0.0 && fit.r_squared <= 1.0);
        assert!(fit.slope.is_finite());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(-1.005, 0), -1.0);
    }
}
