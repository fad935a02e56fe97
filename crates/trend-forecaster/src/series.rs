use crate::regression::fit_ols;
use serde::{Deserialize, Serialize};

/// One (year, value) observation of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
    pub is_forecast: bool,
}

impl SeriesPoint {
    pub fn historical(year: i32, value: Option<f64>) -> Self {
        Self {
            year,
            value,
            is_forecast: false,
        }
    }

    fn trainable(&self, first_year: Option<i32>) -> Option<(f64, f64)> {
        if self.is_forecast || first_year.is_some_and(|y| self.year < y) {
            return None;
        }
        self.value
            .filter(|v| v.is_finite())
            .map(|v| (f64::from(self.year), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    /// Input followed by the projected points.
    Extended(Vec<SeriesPoint>),
    /// Fewer than two usable points: input returned unchanged.
    InsufficientHistory(Vec<SeriesPoint>),
    /// The last projected year does not fit in an `i32`: input returned unchanged.
    HorizonOutOfRange(Vec<SeriesPoint>),
}

impl ForecastOutcome {
    pub fn is_extended(&self) -> bool {
        matches!(self, ForecastOutcome::Extended(_))
    }

    pub fn points(&self) -> &[SeriesPoint] {
        match self {
            ForecastOutcome::Extended(p)
            | ForecastOutcome::InsufficientHistory(p)
            | ForecastOutcome::HorizonOutOfRange(p) => p,
        }
    }

    /// Only the projected points.
    pub fn projected(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points().iter().filter(|p| p.is_forecast)
    }

    pub fn into_points(self) -> Vec<SeriesPoint> {
        match self {
            ForecastOutcome::Extended(p)
            | ForecastOutcome::InsufficientHistory(p)
            | ForecastOutcome::HorizonOutOfRange(p) => p,
        }
    }
}

/// Extend `history` by `horizon` years past its last historical year.
///
/// Forecast points already present in `history` are never trained on, and
/// `first_year` drops earlier years from the fit without dropping them from
/// the output.
pub fn forecast_series(history: &[SeriesPoint], horizon: u32, first_year: Option<i32>) -> ForecastOutcome {
    let mut points: Vec<SeriesPoint> = history.to_vec();
    points.sort_by_key(|p| (p.year, p.is_forecast));

    let training: Vec<(f64, f64)> = points.iter().filter_map(|p| p.trainable(first_year)).collect();
    let Some(fit) = fit_ols(&training) else {
        return ForecastOutcome::InsufficientHistory(points);
    };
    let Some(last_year) = points.iter().filter(|p| !p.is_forecast).map(|p| p.year).max() else {
        return ForecastOutcome::InsufficientHistory(points);
    };

    let Some(end_year) = i32::try_from(horizon).ok().and_then(|h| last_year.checked_add(h)) else {
        return ForecastOutcome::HorizonOutOfRange(points);
    };

    points.retain(|p| !p.is_forecast || p.year <= last_year);
    for year in (last_year..end_year).map(|y| y + 1) {
        points.push(SeriesPoint {
            year,
            value: Some(fit.predict(f64::from(year))),
            is_forecast: true,
        });
    }
    ForecastOutcome::Extended(points)
}
