//! Mapping raw metrics onto [0, 1].
//!
//! Two regimes: relative min-max over the cohort in view, and absolute
//! clipping against fixed bounds. Callers pick one explicitly through
//! [`NormalizationStrategy`].

use index_core::stats::{finite_range, unit_clamp};
use index_core::{AbsoluteBounds, Bound, Metric, MetricRecord, NormalizationStrategy};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of normalizing a single value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationOutcome {
    Scaled(f64),
    /// The range collapsed; carries no discriminating information.
    Degenerate,
}

impl NormalizationOutcome {
    pub const NEUTRAL: f64 = 0.5;

    pub fn value(&self) -> f64 {
        match self {
            NormalizationOutcome::Scaled(v) => *v,
            NormalizationOutcome::Degenerate => Self::NEUTRAL,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, NormalizationOutcome::Degenerate)
    }
}

/// `(x - min) / (max - min)`; `Degenerate` when `max == min`.
pub fn min_max(x: f64, min: f64, max: f64) -> NormalizationOutcome {
    if !(max > min) {
        return NormalizationOutcome::Degenerate;
    }
    NormalizationOutcome::Scaled(unit_clamp((x - min) / (max - min)))
}

/// `clip((x - lo) / (hi - lo), 0, 1)`.
pub fn absolute(x: f64, bound: Bound) -> NormalizationOutcome {
    if !(bound.hi > bound.lo) {
        return NormalizationOutcome::Degenerate;
    }
    NormalizationOutcome::Scaled(unit_clamp((x - bound.lo) / (bound.hi - bound.lo)))
}

/// Min-max over a whole slice; all 0.5 when every value is equal.
pub fn min_max_series(values: &[f64]) -> Vec<f64> {
    match finite_range(values) {
        Some((lo, hi)) => values.iter().map(|v| min_max(*v, lo, hi).value()).collect(),
        None => vec![NormalizationOutcome::NEUTRAL; values.len()],
    }
}

/// A normalizer fixed to one cohort (relative) or one bounds table (absolute).
#[derive(Debug, Clone)]
pub struct CohortNormalizer {
    strategy: NormalizationStrategy,
    ranges: BTreeMap<Metric, (f64, f64)>,
    bounds: AbsoluteBounds,
}

impl CohortNormalizer {
    pub fn new(strategy: NormalizationStrategy, cohort: &[MetricRecord], bounds: AbsoluteBounds) -> Self {
        match strategy {
            NormalizationStrategy::Relative => Self::relative(cohort, bounds),
            NormalizationStrategy::Absolute => Self::absolute(bounds),
        }
    }

    /// Ranges measured over `cohort`. Unavailable values are left out.
    pub fn relative(cohort: &[MetricRecord], bounds: AbsoluteBounds) -> Self {
        let mut ranges = BTreeMap::new();
        for metric in Metric::ALL {
            let values: Vec<f64> = cohort.iter().filter_map(|r| r.metric(metric)).collect();
            if let Some(range) = finite_range(&values) {
                ranges.insert(metric, range);
            }
        }
        let normalizer = Self {
            strategy: NormalizationStrategy::Relative,
            ranges,
            bounds,
        };
        let degenerate = normalizer.degenerate_metrics();
        if !degenerate.is_empty() {
            debug!(
                cohort = cohort.len(),
                metrics = ?degenerate.iter().map(Metric::name).collect::<Vec<_>>(),
                "normalization range collapsed, using neutral 0.5"
            );
        }
        normalizer
    }

    pub fn absolute(bounds: AbsoluteBounds) -> Self {
        Self {
            strategy: NormalizationStrategy::Absolute,
            ranges: BTreeMap::new(),
            bounds,
        }
    }

    pub fn strategy(&self) -> NormalizationStrategy {
        self.strategy
    }

    /// Normalized value, or `None` when the raw value is unavailable.
    pub fn normalize(&self, metric: Metric, value: Option<f64>) -> Option<f64> {
        let x = value?;
        let outcome = match self.strategy {
            NormalizationStrategy::Absolute => absolute(x, self.bounds.get(metric)),
            NormalizationStrategy::Relative => match self.ranges.get(&metric) {
                Some((lo, hi)) => min_max(x, *lo, *hi),
                None => NormalizationOutcome::Degenerate,
            },
        };
        Some(outcome.value())
    }

    /// Metrics whose cohort range collapsed to a single value.
    pub fn degenerate_metrics(&self) -> Vec<Metric> {
        self.ranges
            .iter()
            .filter(|(_, (lo, hi))| !(hi > lo))
            .map(|(m, _)| *m)
            .collect()
    }
}
