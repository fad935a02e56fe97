use serde::{Deserialize, Serialize};

/// `value = intercept + slope * year`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
    /// Number of points the line was fitted on.
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Simple OLS of `y` on `x`.
///
/// Returns `None` with fewer than two points or when every `x` is the same,
/// since no line is identified.
pub fn fit_ols(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for (x, y) in points {
        let dx = x - x_mean;
        let dy = y - y_mean;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_xx < 1e-15 {
        return None;
    }

    let slope = ss_xy / ss_xx;
    let intercept = y_mean - slope * x_mean;
    let r_squared = if ss_yy > 1e-15 {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    } else {
        1.0
    };

    Some(LinearFit {
        intercept,
        slope,
        r_squared,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_points_exact_line() {
        let fit = fit_ols(&[(2023.0, 1000.0), (2024.0, 1200.0)]).unwrap();
        assert_relative_eq!(fit.slope, 200.0, epsilon = 1e-9);
        assert_relative_eq!(fit.predict(2025.0), 1400.0, epsilon = 1e-6);
        assert_relative_eq!(fit.predict(2026.0), 1600.0, epsilon = 1e-6);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noisy_trend() {
        let points: Vec<(f64, f64)> = (0..10)
            .map(|i| {
                let x = 2010.0 + i as f64;
                let noise = if i % 2 == 0 { 1.0 } else { -1.0 };
                (x, 5.0 + 3.0 * i as f64 + noise)
            })
            .collect();
        let fit = fit_ols(&points).unwrap();
        assert!((fit.slope - 3.0).abs() < 0.5);
        assert!(fit.r_squared > 0.9);
    }

    #[test]
    fn test_flat_series() {
        let fit = fit_ols(&[(2020.0, 7.0), (2021.0, 7.0), (2022.0, 7.0)]).unwrap();
        assert_relative_eq!(fit.slope, 0.0, epsilon = 1e-9);
        assert_relative_eq!(fit.predict(2030.0), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn test_underdetermined() {
        assert!(fit_ols(&[]).is_none());
        assert!(fit_ols(&[(2020.0, 1.0)]).is_none());
        assert!(fit_ols(&[(2020.0, 1.0), (2020.0, 2.0)]).is_none());
    }
}
