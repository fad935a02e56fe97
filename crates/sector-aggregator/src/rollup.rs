use crate::summary::{aggregate, AggregateSummary};
use index_core::{CodeLevel, IndustryCode, MetricRecord};
use pkd_codes::section_of;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Aggregate of a section's division rows for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTotal {
    pub section: IndustryCode,
    pub year: i32,
    pub is_forecast: bool,
    pub summary: AggregateSummary,
}

/// Roll division rows up to their sections, per year.
///
/// Divisions outside the range table are left out. Output is ordered by
/// section then year.
pub fn section_rollup(records: &[MetricRecord]) -> Vec<SectionTotal> {
    let mut groups: BTreeMap<(IndustryCode, i32, bool), Vec<&MetricRecord>> = BTreeMap::new();
    for m in records.iter().filter(|m| m.record.code.level() == CodeLevel::Division) {
        match section_of(&m.record.code) {
            Some(section) => groups
                .entry((section, m.record.year, m.record.is_forecast))
                .or_default()
                .push(m),
            None => debug!(code = %m.record.code, "division outside section table, not rolled up"),
        }
    }

    groups
        .into_iter()
        .map(|((section, year, is_forecast), rows)| SectionTotal {
            section,
            year,
            is_forecast,
            summary: aggregate(rows),
        })
        .collect()
}

/// A section row whose reported total disagrees with its divisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupMismatch {
    pub section: IndustryCode,
    pub year: i32,
    pub field: &'static str,
    pub reported: Decimal,
    pub from_children: Decimal,
}

impl RollupMismatch {
    pub fn difference(&self) -> Decimal {
        self.reported - self.from_children
    }
}

fn fields(s: &AggregateSummary) -> [(&'static str, Decimal); 6] {
    [
        ("revenue", s.revenue),
        ("net_profit", s.net_profit),
        ("liabilities_long", s.liabilities_long),
        ("liabilities_short", s.liabilities_short),
        ("cash", s.cash),
        ("entity_count", s.entity_count),
    ]
}

fn within(reported: Decimal, children: Decimal, tolerance: Decimal) -> bool {
    let scale = reported.abs().max(children.abs()).max(Decimal::ONE);
    (reported - children).abs() <= tolerance * scale
}

/// Compare every historical section row against the sum of its divisions.
///
/// `tolerance` is relative to the larger of the two magnitudes. Sections
/// without loaded divisions for that year are not checked. Mismatches are
/// logged and returned; they never stop the pipeline.
pub fn verify_section_rollups(records: &[MetricRecord], tolerance: f64) -> Vec<RollupMismatch> {
    let tolerance = Decimal::from_f64(tolerance.max(0.0)).unwrap_or(Decimal::ZERO);
    let historical: Vec<MetricRecord> = records.iter().filter(|m| !m.record.is_forecast).cloned().collect();
    let totals: BTreeMap<(IndustryCode, i32), AggregateSummary> = section_rollup(&historical)
        .into_iter()
        .map(|t| ((t.section, t.year), t.summary))
        .collect();

    let mut mismatches = Vec::new();
    for m in historical.iter().filter(|m| m.record.code.is_section()) {
        let Some(children) = totals.get(&(m.record.code.clone(), m.record.year)) else {
            continue;
        };
        let reported = AggregateSummary::from_record(m);
        for ((field, r), (_, c)) in fields(&reported).into_iter().zip(fields(children)) {
            if !within(r, c, tolerance) {
                warn!(
                    section = %m.record.code,
                    year = m.record.year,
                    field,
                    reported = %r,
                    from_children = %c,
                    "section total does not match its divisions"
                );
                mismatches.push(RollupMismatch {
                    section: m.record.code.clone(),
                    year: m.record.year,
                    field,
                    reported: r,
                    from_children: c,
                });
            }
        }
    }
    mismatches
}
