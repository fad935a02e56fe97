use index_core::{CodeLevel, IndustryCode, IndustryRecord};
use pkd_codes::section_of;
use serde::{Deserialize, Serialize};

/// Row selection equivalent to the dashboard filters.
///
/// Every unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortFilter {
    pub year: Option<i32>,
    pub level: Option<CodeLevel>,
    /// Restrict to codes enclosed by this section.
    pub section: Option<IndustryCode>,
    pub min_revenue: Option<f64>,
}

impl CohortFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: CodeLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_section(mut self, letter: char) -> Self {
        self.section = Some(IndustryCode::section(letter));
        self
    }

    pub fn with_min_revenue(mut self, min_revenue: f64) -> Self {
        self.min_revenue = Some(min_revenue);
        self
    }

    pub fn matches(&self, record: &IndustryRecord) -> bool {
        self.year.map_or(true, |y| record.year == y)
            && self.level.map_or(true, |l| record.code.level() == l)
            && self
                .section
                .as_ref()
                .map_or(true, |s| section_of(&record.code).as_ref() == Some(s))
            && self.min_revenue.map_or(true, |min| record.raw.revenue >= min)
    }
}
