//! Numeric helpers shared by the deriver, scorer and aggregator.
//!
//! All of them are total: a zero denominator or an empty slice yields the
//! caller's fallback instead of NaN or infinity.

/// `numerator / denominator`, or `fallback` when the denominator is zero or
/// the quotient is not finite.
pub fn safe_div(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator == 0.0 {
        return fallback;
    }
    let q = numerator / denominator;
    if q.is_finite() {
        q
    } else {
        fallback
    }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Minimum and maximum of the finite values in `data`.
pub fn finite_range(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Clamp to the unit interval, mapping NaN to 0.
pub fn unit_clamp(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
