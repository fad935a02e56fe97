use crate::series::{forecast_series, ForecastOutcome, SeriesPoint};
use index_core::{Availability, ForecastConfig, IndustryCode, IndustryRecord, RawField};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

fn series_of(history: &[IndustryRecord], field: RawField) -> Vec<SeriesPoint> {
    history
        .iter()
        .map(|r| SeriesPoint::historical(r.year, r.field(field)))
        .collect()
}

fn forecast_field(history: &[IndustryRecord], field: RawField, config: &ForecastConfig) -> ForecastOutcome {
    let first_year = config.window_for(field).map(|w| w.first_year);
    forecast_series(&series_of(history, field), config.horizon, first_year)
}

fn clamp_field(field: RawField, value: f64) -> f64 {
    if field.allows_negative() {
        value
    } else {
        value.max(0.0)
    }
}

/// Synthetic forecast rows for one entity.
///
/// Only historical rows of `history` are used. The anchor field decides the
/// target years; every other field is filled into that skeleton by year. A
/// field that cannot be fitted is carried forward at its last observed value.
/// Returns no rows when the anchor itself cannot be fitted.
pub fn forecast_entity(history: &[IndustryRecord], config: &ForecastConfig) -> Vec<IndustryRecord> {
    let mut rows: Vec<IndustryRecord> = history.iter().filter(|r| !r.is_forecast).cloned().collect();
    rows.sort_by_key(|r| r.year);
    let Some(template) = rows.last() else {
        return Vec::new();
    };
    if config.horizon == 0 {
        return Vec::new();
    }

    let anchor = forecast_field(&rows, config.anchor, config);
    if !anchor.is_extended() {
        debug!(
            code = %template.code,
            field = config.anchor.name(),
            "anchor field has insufficient history, no forecast rows"
        );
        return Vec::new();
    }

    let mut forecast: Vec<IndustryRecord> = anchor
        .projected()
        .map(|p| {
            let mut record = template.clone();
            record.year = p.year;
            record.is_forecast = true;
            record.set_field(config.anchor, clamp_field(config.anchor, p.value.unwrap_or(0.0)));
            record
        })
        .collect();

    for field in RawField::ALL.into_iter().filter(|f| *f != config.anchor) {
        let outcome = forecast_field(&rows, field, config);
        if outcome.is_extended() {
            let by_year: HashMap<i32, f64> = outcome
                .projected()
                .filter_map(|p| p.value.map(|v| (p.year, v)))
                .collect();
            for record in &mut forecast {
                if let Some(v) = by_year.get(&record.year) {
                    record.set_field(field, clamp_field(field, *v));
                }
            }
        } else {
            let last = rows.iter().rev().find_map(|r| r.field(field));
            debug!(
                code = %template.code,
                field = field.name(),
                carried = ?last,
                "insufficient history, carrying last value forward"
            );
            for record in &mut forecast {
                match last {
                    Some(v) => record.set_field(field, v),
                    None if field == RawField::ArxivPapers => record.arxiv_papers = Availability::DataUnavailable,
                    None => {}
                }
            }
        }
    }

    forecast
}

/// Forecast every entity in `records`, in parallel across entities.
///
/// Output is grouped by code in code order, years ascending within a code.
pub fn forecast_all(records: &[IndustryRecord], config: &ForecastConfig) -> Vec<IndustryRecord> {
    let mut by_entity: BTreeMap<&IndustryCode, Vec<IndustryRecord>> = BTreeMap::new();
    for record in records {
        by_entity.entry(&record.code).or_default().push(record.clone());
    }
    let entities: Vec<Vec<IndustryRecord>> = by_entity.into_values().collect();

    entities
        .par_iter()
        .map(|history| forecast_entity(history, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use index_core::{CodeLevel, RawAggregates};

    fn row(code: &str, year: i32, revenue: f64, net_profit: f64) -> IndustryRecord {
        IndustryRecord::historical(
            IndustryCode::new(code, CodeLevel::Division),
            format!("Division {code}"),
            year,
            RawAggregates {
                revenue,
                net_profit,
                entity_count: 10.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_anchor_years_shared_by_all_fields() {
        let history = vec![row("41", 2023, 1000.0, 50.0), row("41", 2024, 1200.0, 70.0)];
        let out = forecast_entity(&history, &ForecastConfig::default());
        let years: Vec<i32> = out.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2025, 2026]);
        assert!(out.iter().all(|r| r.is_forecast));
        assert_eq!(out[0].name, "Division 41");
        assert_relative_eq!(out[0].raw.revenue, 1400.0, epsilon = 1e-6);
        assert_relative_eq!(out[1].raw.revenue, 1600.0, epsilon = 1e-6);
        assert_relative_eq!(out[1].raw.net_profit, 110.0, epsilon = 1e-6);
        assert_relative_eq!(out[1].raw.entity_count, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_year_gets_no_forecast() {
        let out = forecast_entity(&[row("41", 2024, 1200.0, 70.0)], &ForecastConfig::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_non_negative_fields_clamped() {
        let history = vec![row("41", 2023, 300.0, 10.0), row("41", 2024, 100.0, -100.0)];
        let out = forecast_entity(&history, &ForecastConfig::default());
        assert_eq!(out[1].raw.revenue, 0.0);
        assert!(out[1].raw.net_profit < 0.0);
    }

    #[test]
    fn test_research_field_carried_forward_or_unavailable() {
        let mut history = vec![row("41", 2023, 1000.0, 50.0), row("41", 2024, 1200.0, 70.0)];
        let out = forecast_entity(&history, &ForecastConfig::default());
        assert_eq!(out[0].arxiv_papers, Availability::DataUnavailable);

        history[1].arxiv_papers = Availability::Available(42.0);
        let out = forecast_entity(&history, &ForecastConfig::default());
        assert_eq!(out[0].arxiv_papers, Availability::Available(42.0));
    }

    #[test]
    fn test_research_window_from_2019() {
        let mut history: Vec<IndustryRecord> = (2015..=2021)
            .map(|y| row("62", y, 1000.0 + f64::from(y - 2015) * 10.0, 1.0))
            .collect();
        for r in &mut history {
            let papers = if r.year < 2019 { 0.0 } else { f64::from(r.year - 2018) * 100.0 };
            r.arxiv_papers = Availability::Available(papers);
        }
        let out = forecast_entity(&history, &ForecastConfig::default().with_horizon(1));
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].arxiv_papers.value().unwrap(), 400.0, epsilon = 1e-6);
    }

    #[test]
    fn test_forecast_all_keeps_entity_order() {
        let records = vec![
            row("62", 2023, 10.0, 1.0),
            row("41", 2023, 1000.0, 1.0),
            row("62", 2024, 20.0, 1.0),
            row("41", 2024, 1200.0, 1.0),
            row("43", 2024, 5.0, 1.0),
        ];
        let out = forecast_all(&records, &ForecastConfig::default());
        let keys: Vec<(&str, i32)> = out.iter().map(|r| (r.code.key(), r.year)).collect();
        assert_eq!(keys, vec![("41", 2025), ("41", 2026), ("62", 2025), ("62", 2026)]);
    }
}
