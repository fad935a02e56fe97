use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used for canonical section keys (`SEK_A`, `SEK_F`, ...).
pub const SECTION_PREFIX: &str = "SEK_";

/// Position of a code in the section → division → group → class tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CodeLevel {
    Section,
    Division,
    Group,
    Class,
    /// Matched no granularity and no range-table entry ("Other" bucket).
    Unclassified,
}

impl CodeLevel {
    /// Immediate next granularity down, if any.
    pub fn child(&self) -> Option<CodeLevel> {
        match self {
            CodeLevel::Section => Some(CodeLevel::Division),
            CodeLevel::Division => Some(CodeLevel::Group),
            CodeLevel::Group => Some(CodeLevel::Class),
            CodeLevel::Class | CodeLevel::Unclassified => None,
        }
    }

    /// Immediate next granularity up, if any.
    pub fn parent(&self) -> Option<CodeLevel> {
        match self {
            CodeLevel::Division => Some(CodeLevel::Section),
            CodeLevel::Group => Some(CodeLevel::Division),
            CodeLevel::Class => Some(CodeLevel::Group),
            CodeLevel::Section | CodeLevel::Unclassified => None,
        }
    }

    /// Number of digits in a numeric code at this level.
    pub fn digits(&self) -> Option<usize> {
        match self {
            CodeLevel::Division => Some(2),
            CodeLevel::Group => Some(3),
            CodeLevel::Class => Some(4),
            CodeLevel::Section | CodeLevel::Unclassified => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CodeLevel::Section => "SECTION",
            CodeLevel::Division => "L2",
            CodeLevel::Group => "L3",
            CodeLevel::Class => "L4",
            CodeLevel::Unclassified => "OTHER",
        }
    }
}

impl fmt::Display for CodeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CodeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SECTION" | "L1" => Ok(CodeLevel::Section),
            "L2" | "DIVISION" => Ok(CodeLevel::Division),
            "L3" | "GROUP" => Ok(CodeLevel::Group),
            "L4" | "CLASS" => Ok(CodeLevel::Class),
            "OTHER" => Ok(CodeLevel::Unclassified),
            other => Err(format!("unknown granularity level '{other}'")),
        }
    }
}

/// Canonical merge key plus its granularity.
///
/// Numeric codes are bare digit strings (`41`, `412`, `4120`); sections are
/// `SEK_` followed by the section letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndustryCode {
    key: String,
    level: CodeLevel,
}

impl IndustryCode {
    pub fn new(key: impl Into<String>, level: CodeLevel) -> Self {
        Self {
            key: key.into(),
            level,
        }
    }

    pub fn section(letter: char) -> Self {
        Self::new(
            format!("{SECTION_PREFIX}{}", letter.to_ascii_uppercase()),
            CodeLevel::Section,
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn level(&self) -> CodeLevel {
        self.level
    }

    pub fn is_section(&self) -> bool {
        self.level == CodeLevel::Section
    }

    pub fn section_letter(&self) -> Option<char> {
        if !self.is_section() {
            return None;
        }
        self.key.strip_prefix(SECTION_PREFIX)?.chars().next()
    }

    /// Two-digit division number of a numeric code (`4120` → 41).
    pub fn division_number(&self) -> Option<u32> {
        self.level.digits()?;
        self.key.get(..2)?.parse().ok()
    }
}

impl fmt::Display for IndustryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// A value that may be absent from its external source.
///
/// Absence stays visible all the way to the output table instead of being
/// replaced by a synthetic stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Availability {
    Available(f64),
    #[default]
    DataUnavailable,
}

impl Availability {
    pub fn value(&self) -> Option<f64> {
        match self {
            Availability::Available(v) => Some(*v),
            Availability::DataUnavailable => None,
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Availability::Available(v),
            _ => Availability::DataUnavailable,
        }
    }
}

/// Raw per-entity aggregates; each is a sum over all legal entities
/// classified under the code for that year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAggregates {
    pub revenue: f64,
    /// May be negative.
    pub net_profit: f64,
    pub liabilities_long: f64,
    pub liabilities_short: f64,
    pub cash: f64,
    pub investment: f64,
    pub entity_count: f64,
    pub profitable_entity_count: f64,
    pub bankruptcy_count: f64,
}

impl RawAggregates {
    pub fn total_debt(&self) -> f64 {
        self.liabilities_long + self.liabilities_short
    }
}

/// Fields the forecaster can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawField {
    Revenue,
    NetProfit,
    LiabilitiesLong,
    LiabilitiesShort,
    Cash,
    Investment,
    EntityCount,
    ProfitableEntityCount,
    BankruptcyCount,
    ArxivPapers,
}

impl RawField {
    pub const ALL: [RawField; 10] = [
        RawField::Revenue,
        RawField::NetProfit,
        RawField::LiabilitiesLong,
        RawField::LiabilitiesShort,
        RawField::Cash,
        RawField::Investment,
        RawField::EntityCount,
        RawField::ProfitableEntityCount,
        RawField::BankruptcyCount,
        RawField::ArxivPapers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RawField::Revenue => "revenue",
            RawField::NetProfit => "net_profit",
            RawField::LiabilitiesLong => "liabilities_long",
            RawField::LiabilitiesShort => "liabilities_short",
            RawField::Cash => "cash",
            RawField::Investment => "investment",
            RawField::EntityCount => "entity_count",
            RawField::ProfitableEntityCount => "profitable_entity_count",
            RawField::BankruptcyCount => "bankruptcy_count",
            RawField::ArxivPapers => "arxiv_papers",
        }
    }

    pub fn allows_negative(&self) -> bool {
        matches!(self, RawField::NetProfit)
    }
}

/// One row per (code, year, is_forecast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRecord {
    pub code: IndustryCode,
    /// Display label only; never a join key.
    pub name: String,
    pub year: i32,
    pub is_forecast: bool,
    pub raw: RawAggregates,
    pub arxiv_papers: Availability,
}

impl IndustryRecord {
    pub fn historical(code: IndustryCode, name: impl Into<String>, year: i32, raw: RawAggregates) -> Self {
        Self {
            code,
            name: name.into(),
            year,
            is_forecast: false,
            raw,
            arxiv_papers: Availability::DataUnavailable,
        }
    }

    /// No revenue and no debt: dormant entity or a data error.
    pub fn is_dormant(&self) -> bool {
        self.raw.revenue == 0.0 && self.raw.total_debt() == 0.0
    }

    pub fn field(&self, field: RawField) -> Option<f64> {
        let raw = &self.raw;
        match field {
            RawField::Revenue => Some(raw.revenue),
            RawField::NetProfit => Some(raw.net_profit),
            RawField::LiabilitiesLong => Some(raw.liabilities_long),
            RawField::LiabilitiesShort => Some(raw.liabilities_short),
            RawField::Cash => Some(raw.cash),
            RawField::Investment => Some(raw.investment),
            RawField::EntityCount => Some(raw.entity_count),
            RawField::ProfitableEntityCount => Some(raw.profitable_entity_count),
            RawField::BankruptcyCount => Some(raw.bankruptcy_count),
            RawField::ArxivPapers => self.arxiv_papers.value(),
        }
    }

    pub fn set_field(&mut self, field: RawField, value: f64) {
        let raw = &mut self.raw;
        match field {
            RawField::Revenue => raw.revenue = value,
            RawField::NetProfit => raw.net_profit = value,
            RawField::LiabilitiesLong => raw.liabilities_long = value,
            RawField::LiabilitiesShort => raw.liabilities_short = value,
            RawField::Cash => raw.cash = value,
            RawField::Investment => raw.investment = value,
            RawField::EntityCount => raw.entity_count = value,
            RawField::ProfitableEntityCount => raw.profitable_entity_count = value,
            RawField::BankruptcyCount => raw.bankruptcy_count = value,
            RawField::ArxivPapers => self.arxiv_papers = Availability::from_option(Some(value)),
        }
    }
}

/// Ratios computed from [`RawAggregates`].
///
/// Units: `bankruptcy_rate` is a percentage (×100); every other rate is a
/// fraction or a plain ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub net_profit_margin: f64,
    pub debt_to_revenue: f64,
    pub cash_ratio: f64,
    pub capex_intensity: f64,
    /// Percent.
    pub bankruptcy_rate: f64,
    pub dynamics_yoy: f64,
    pub share_profitable: f64,
    pub total_debt: f64,
    /// Same entity's revenue one year earlier, when present.
    pub revenue_prev_year: Option<f64>,
}

/// Metrics that enter normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DynamicsYoy,
    NetProfitMargin,
    ShareProfitable,
    CashRatio,
    DebtToRevenue,
    BankruptcyRate,
    CapexIntensity,
    ArxivPapers,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::DynamicsYoy,
        Metric::NetProfitMargin,
        Metric::ShareProfitable,
        Metric::CashRatio,
        Metric::DebtToRevenue,
        Metric::BankruptcyRate,
        Metric::CapexIntensity,
        Metric::ArxivPapers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::DynamicsYoy => "dynamics_yoy",
            Metric::NetProfitMargin => "net_profit_margin",
            Metric::ShareProfitable => "share_profitable",
            Metric::CashRatio => "cash_ratio",
            Metric::DebtToRevenue => "debt_to_revenue",
            Metric::BankruptcyRate => "bankruptcy_rate",
            Metric::CapexIntensity => "capex_intensity",
            Metric::ArxivPapers => "arxiv_papers",
        }
    }
}

/// Record with its derived ratios attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub record: IndustryRecord,
    pub derived: DerivedMetrics,
}

impl MetricRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        let d = &self.derived;
        match metric {
            Metric::DynamicsYoy => Some(d.dynamics_yoy),
            Metric::NetProfitMargin => Some(d.net_profit_margin),
            Metric::ShareProfitable => Some(d.share_profitable),
            Metric::CashRatio => Some(d.cash_ratio),
            Metric::DebtToRevenue => Some(d.debt_to_revenue),
            Metric::BankruptcyRate => Some(d.bankruptcy_rate),
            Metric::CapexIntensity => Some(d.capex_intensity),
            Metric::ArxivPapers => self.record.arxiv_papers.value(),
        }
    }
}

/// Which normalization regime produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationStrategy {
    /// Min-max over the current cohort.
    Relative,
    /// Fixed, hand-calibrated bounds per metric.
    Absolute,
}

impl NormalizationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationStrategy::Relative => "relative",
            NormalizationStrategy::Absolute => "absolute",
        }
    }
}

impl FromStr for NormalizationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relative" => Ok(NormalizationStrategy::Relative),
            "absolute" => Ok(NormalizationStrategy::Absolute),
            other => Err(format!("unknown normalization strategy '{other}'")),
        }
    }
}

/// Sub-scores (0-1) and composite scores (0-100) for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub growth: f64,
    pub profitability: f64,
    pub safety: f64,
    pub liquidity: f64,
    pub stability_score: f64,
    pub transformation_score: f64,
    pub lending_score: f64,
}

/// Current-view status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Critical,
    Opportunity,
    Neutral,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Critical => "CRITICAL",
            Status::Opportunity => "OPPORTUNITY",
            Status::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Richer label set for forecast years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastStatus {
    Critical,
    FutureLeader,
    RisingStar,
    SafeHaven,
    LendingTarget,
    Neutral,
}

impl ForecastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastStatus::Critical => "CRITICAL",
            ForecastStatus::FutureLeader => "FUTURE_LEADER",
            ForecastStatus::RisingStar => "RISING_STAR",
            ForecastStatus::SafeHaven => "SAFE_HAVEN",
            ForecastStatus::LendingTarget => "LENDING_TARGET",
            ForecastStatus::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully scored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub metrics: MetricRecord,
    pub scores: ScoreBreakdown,
    pub strategy: NormalizationStrategy,
    pub status: Status,
    /// Only set on forecast rows.
    pub forecast_status: Option<ForecastStatus>,
}

impl ScoredRecord {
    pub fn record(&self) -> &IndustryRecord {
        &self.metrics.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_navigation() {
        assert_eq!(CodeLevel::Section.child(), Some(CodeLevel::Division));
        assert_eq!(CodeLevel::Class.child(), None);
        assert_eq!(CodeLevel::Group.parent(), Some(CodeLevel::Division));
        assert_eq!(CodeLevel::Unclassified.parent(), None);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("l1".parse::<CodeLevel>(), Ok(CodeLevel::Section));
        assert_eq!("L3".parse::<CodeLevel>(), Ok(CodeLevel::Group));
        assert!("L9".parse::<CodeLevel>().is_err());
    }

    #[test]
    fn test_section_code_accessors() {
        let code = IndustryCode::section('f');
        assert_eq!(code.key(), "SEK_F");
        assert_eq!(code.section_letter(), Some('F'));
        assert_eq!(code.division_number(), None);

        let class = IndustryCode::new("4120", CodeLevel::Class);
        assert_eq!(class.division_number(), Some(41));
        assert_eq!(class.section_letter(), None);
    }

    #[test]
    fn test_record_field_roundtrip() {
        let mut rec = IndustryRecord::historical(
            IndustryCode::new("41", CodeLevel::Division),
            "Construction of buildings",
            2024,
            RawAggregates::default(),
        );
        assert_eq!(rec.field(RawField::ArxivPapers), None);
        rec.set_field(RawField::Revenue, 1200.0);
        rec.set_field(RawField::ArxivPapers, 35.0);
        assert_eq!(rec.field(RawField::Revenue), Some(1200.0));
        assert_eq!(rec.arxiv_papers, Availability::Available(35.0));
    }

    #[test]
    fn test_dormant_detection() {
        let mut rec = IndustryRecord::historical(
            IndustryCode::new("01", CodeLevel::Division),
            "Crop and animal production",
            2020,
            RawAggregates::default(),
        );
        assert!(rec.is_dormant());
        rec.raw.liabilities_short = 3.0;
        assert!(!rec.is_dormant());
    }
}
