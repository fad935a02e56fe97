//! Per-entity linear trend forecasts.
//!
//! Each raw field is fitted independently by ordinary least squares on year,
//! trained on historical rows only. Forecast rows share the year skeleton of
//! the anchor field.

pub mod entity;
pub mod regression;
pub mod series;

pub use entity::{forecast_all, forecast_entity};
pub use regression::{fit_ols, LinearFit};
pub use series::{forecast_series, ForecastOutcome, SeriesPoint};
