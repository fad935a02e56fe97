//! Derived financial ratios.
//!
//! Every ratio is `numerator / denominator` with a fallback of 0 when the
//! denominator is zero, so no row ever yields NaN or infinity.

use index_core::stats::safe_div;
use index_core::{DerivedMetrics, IndustryCode, IndustryRecord, MetricRecord, RawAggregates};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Fallback for every rate-like field.
pub const RATE_FALLBACK: f64 = 0.0;

pub fn net_profit_margin(raw: &RawAggregates) -> f64 {
    safe_div(raw.net_profit, raw.revenue, RATE_FALLBACK)
}

pub fn debt_to_revenue(raw: &RawAggregates) -> f64 {
    safe_div(raw.total_debt(), raw.revenue, RATE_FALLBACK)
}

pub fn cash_ratio(raw: &RawAggregates) -> f64 {
    safe_div(raw.cash, raw.liabilities_short, RATE_FALLBACK)
}

pub fn capex_intensity(raw: &RawAggregates) -> f64 {
    safe_div(raw.investment, raw.revenue, RATE_FALLBACK)
}

/// Percentage units (×100), unlike the other rates.
pub fn bankruptcy_rate(raw: &RawAggregates) -> f64 {
    safe_div(raw.bankruptcy_count, raw.entity_count, RATE_FALLBACK) * 100.0
}

pub fn share_profitable(raw: &RawAggregates) -> f64 {
    safe_div(raw.profitable_entity_count, raw.entity_count, RATE_FALLBACK)
}

/// Year-over-year revenue change as a fraction.
///
/// No prior year, or a prior revenue of zero, shows no growth at all.
pub fn dynamics_yoy(revenue: f64, prior_revenue: Option<f64>) -> f64 {
    match prior_revenue {
        Some(prior) => safe_div(revenue - prior, prior, RATE_FALLBACK),
        None => RATE_FALLBACK,
    }
}

/// Derive every ratio for one record given the same entity's prior-year revenue.
pub fn derive(record: &IndustryRecord, prior_revenue: Option<f64>) -> DerivedMetrics {
    let raw = &record.raw;
    DerivedMetrics {
        net_profit_margin: net_profit_margin(raw),
        debt_to_revenue: debt_to_revenue(raw),
        cash_ratio: cash_ratio(raw),
        capex_intensity: capex_intensity(raw),
        bankruptcy_rate: bankruptcy_rate(raw),
        dynamics_yoy: dynamics_yoy(raw.revenue, prior_revenue),
        share_profitable: share_profitable(raw),
        total_debt: raw.total_debt(),
        revenue_prev_year: prior_revenue,
    }
}

/// Denominators that were zero, counted for the audit log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroDenominators {
    pub revenue: usize,
    pub liabilities_short: usize,
    pub entity_count: usize,
    pub prior_revenue: usize,
}

impl ZeroDenominators {
    fn observe(&mut self, record: &IndustryRecord, prior_revenue: Option<f64>) {
        let raw = &record.raw;
        self.revenue += usize::from(raw.revenue == 0.0);
        self.liabilities_short += usize::from(raw.liabilities_short == 0.0);
        self.entity_count += usize::from(raw.entity_count == 0.0);
        self.prior_revenue += usize::from(prior_revenue == Some(0.0));
    }

    pub fn total(&self) -> usize {
        self.revenue + self.liabilities_short + self.entity_count + self.prior_revenue
    }
}

/// Derive ratios for a whole table.
///
/// Records are grouped per entity and ordered by year; `dynamics_yoy` looks
/// back exactly one year within the same entity. Output is ordered by
/// (code, year, is_forecast).
pub fn derive_series(records: Vec<IndustryRecord>) -> Vec<MetricRecord> {
    let mut by_entity: BTreeMap<IndustryCode, Vec<IndustryRecord>> = BTreeMap::new();
    for record in records {
        by_entity.entry(record.code.clone()).or_default().push(record);
    }

    let mut zeros = ZeroDenominators::default();
    let mut out = Vec::new();
    for (_, mut rows) in by_entity {
        rows.sort_by_key(|r| (r.year, r.is_forecast));

        // Historical revenue wins over a forecast for the same year.
        let mut revenue_by_year: HashMap<i32, f64> = HashMap::new();
        for row in rows.iter().rev() {
            revenue_by_year.insert(row.year, row.raw.revenue);
        }

        for row in rows {
            let prior = revenue_by_year.get(&(row.year - 1)).copied();
            zeros.observe(&row, prior);
            let derived = derive(&row, prior);
            out.push(MetricRecord { record: row, derived });
        }
    }

    if zeros.total() > 0 {
        debug!(
            revenue = zeros.revenue,
            liabilities_short = zeros.liabilities_short,
            entity_count = zeros.entity_count,
            prior_revenue = zeros.prior_revenue,
            "zero denominators replaced by fallback"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use index_core::CodeLevel;

    fn record(code: &str, year: i32, raw: RawAggregates) -> IndustryRecord {
        IndustryRecord::historical(IndustryCode::new(code, CodeLevel::Division), code, year, raw)
    }

    fn revenue_only(code: &str, year: i32, revenue: f64) -> IndustryRecord {
        record(
            code,
            year,
            RawAggregates {
                revenue,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_zero_revenue_margin_falls_back() {
        let raw = RawAggregates {
            revenue: 0.0,
            net_profit: 500.0,
            ..Default::default()
        };
        assert_eq!(net_profit_margin(&raw), 0.0);
        assert_eq!(debt_to_revenue(&raw), 0.0);
        assert_eq!(capex_intensity(&raw), 0.0);
    }

    #[test]
    fn test_all_zero_row_is_finite() {
        let d = derive(&record("41", 2024, RawAggregates::default()), Some(0.0));
        for v in [
            d.net_profit_margin,
            d.debt_to_revenue,
            d.cash_ratio,
            d.capex_intensity,
            d.bankruptcy_rate,
            d.dynamics_yoy,
            d.share_profitable,
        ] {
            assert!(v.is_finite());
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_ratio_units() {
        let raw = RawAggregates {
            revenue: 2000.0,
            net_profit: 100.0,
            liabilities_long: 600.0,
            liabilities_short: 400.0,
            cash: 200.0,
            investment: 150.0,
            entity_count: 200.0,
            profitable_entity_count: 150.0,
            bankruptcy_count: 9.0,
        };
        let d = derive(&record("41", 2024, raw), None);
        assert_relative_eq!(d.net_profit_margin, 0.05, epsilon = 1e-9);
        assert_relative_eq!(d.debt_to_revenue, 0.5, epsilon = 1e-9);
        assert_relative_eq!(d.cash_ratio, 0.5, epsilon = 1e-9);
        assert_relative_eq!(d.capex_intensity, 0.075, epsilon = 1e-9);
        assert_relative_eq!(d.bankruptcy_rate, 4.5, epsilon = 1e-9);
        assert_relative_eq!(d.share_profitable, 0.75, epsilon = 1e-9);
        assert_relative_eq!(d.total_debt, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_profit_gives_negative_margin() {
        let raw = RawAggregates {
            revenue: 1000.0,
            net_profit: -50.0,
            ..Default::default()
        };
        assert_relative_eq!(net_profit_margin(&raw), -0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_dynamics_uses_same_entity_prior_year() {
        let rows = vec![
            revenue_only("41", 2024, 1200.0),
            revenue_only("42", 2023, 10.0),
            revenue_only("41", 2023, 1000.0),
        ];
        let derived = derive_series(rows);
        let y2024 = derived
            .iter()
            .find(|m| m.record.code.key() == "41" && m.record.year == 2024)
            .unwrap();
        assert_relative_eq!(y2024.derived.dynamics_yoy, 0.20, epsilon = 1e-9);
        assert_eq!(y2024.derived.revenue_prev_year, Some(1000.0));
    }

    #[test]
    fn test_first_year_and_gap_years_show_no_growth() {
        let rows = vec![revenue_only("41", 2019, 500.0), revenue_only("41", 2021, 900.0)];
        let derived = derive_series(rows);
        assert!(derived.iter().all(|m| m.derived.dynamics_yoy == 0.0));
        assert!(derived.iter().all(|m| m.derived.revenue_prev_year.is_none()));
    }

    #[test]
    fn test_zero_prior_revenue_shows_no_growth() {
        let derived = derive_series(vec![revenue_only("41", 2022, 0.0), revenue_only("41", 2023, 700.0)]);
        assert_eq!(derived[1].derived.dynamics_yoy, 0.0);
    }

    #[test]
    fn test_series_ordering() {
        let derived = derive_series(vec![
            revenue_only("42", 2020, 1.0),
            revenue_only("41", 2021, 1.0),
            revenue_only("41", 2020, 1.0),
        ]);
        let keys: Vec<(&str, i32)> = derived.iter().map(|m| (m.record.code.key(), m.record.year)).collect();
        assert_eq!(keys, vec![("41", 2020), ("41", 2021), ("42", 2020)]);
    }
}
