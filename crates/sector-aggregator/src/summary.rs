use index_core::stats::safe_div;
use index_core::MetricRecord;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::Add;

fn dec(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn float(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Summed aggregates of a set of entity rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub rows: usize,
    pub revenue: Decimal,
    pub net_profit: Decimal,
    pub liabilities_long: Decimal,
    pub liabilities_short: Decimal,
    pub cash: Decimal,
    pub investment: Decimal,
    pub entity_count: Decimal,
    pub profitable_entity_count: Decimal,
    pub bankruptcy_count: Decimal,
    /// Sum of each row's reconstructed prior-year revenue.
    pub prior_revenue: Decimal,
}

impl AggregateSummary {
    pub fn from_record(m: &MetricRecord) -> Self {
        let raw = &m.record.raw;
        let dynamics = m.derived.dynamics_yoy;
        // Total collapse leaves no prior revenue to reconstruct.
        let prior_revenue = if dynamics == -1.0 {
            Decimal::ZERO
        } else {
            dec(safe_div(raw.revenue, 1.0 + dynamics, 0.0))
        };
        Self {
            rows: 1,
            revenue: dec(raw.revenue),
            net_profit: dec(raw.net_profit),
            liabilities_long: dec(raw.liabilities_long),
            liabilities_short: dec(raw.liabilities_short),
            cash: dec(raw.cash),
            investment: dec(raw.investment),
            entity_count: dec(raw.entity_count),
            profitable_entity_count: dec(raw.profitable_entity_count),
            bankruptcy_count: dec(raw.bankruptcy_count),
            prior_revenue,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            rows: self.rows + other.rows,
            revenue: self.revenue + other.revenue,
            net_profit: self.net_profit + other.net_profit,
            liabilities_long: self.liabilities_long + other.liabilities_long,
            liabilities_short: self.liabilities_short + other.liabilities_short,
            cash: self.cash + other.cash,
            investment: self.investment + other.investment,
            entity_count: self.entity_count + other.entity_count,
            profitable_entity_count: self.profitable_entity_count + other.profitable_entity_count,
            bankruptcy_count: self.bankruptcy_count + other.bankruptcy_count,
            prior_revenue: self.prior_revenue + other.prior_revenue,
        }
    }

    pub fn total_debt(&self) -> Decimal {
        self.liabilities_long + self.liabilities_short
    }

    pub fn dynamics_yoy(&self) -> f64 {
        safe_div(float(self.revenue - self.prior_revenue), float(self.prior_revenue), 0.0)
    }

    pub fn net_profit_margin(&self) -> f64 {
        safe_div(float(self.net_profit), float(self.revenue), 0.0)
    }

    pub fn debt_to_revenue(&self) -> f64 {
        safe_div(float(self.total_debt()), float(self.revenue), 0.0)
    }

    pub fn cash_ratio(&self) -> f64 {
        safe_div(float(self.cash), float(self.liabilities_short), 0.0)
    }

    pub fn capex_intensity(&self) -> f64 {
        safe_div(float(self.investment), float(self.revenue), 0.0)
    }

    /// Percent.
    pub fn bankruptcy_rate(&self) -> f64 {
        safe_div(float(self.bankruptcy_count), float(self.entity_count), 0.0) * 100.0
    }

    pub fn share_profitable(&self) -> f64 {
        safe_div(float(self.profitable_entity_count), float(self.entity_count), 0.0)
    }
}

impl Add for AggregateSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.merge(rhs)
    }
}

impl Sum for AggregateSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Self::merge)
    }
}

/// Roll a set of rows into one summary.
pub fn aggregate<'a, I>(records: I) -> AggregateSummary
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    records.into_iter().map(AggregateSummary::from_record).sum()
}
