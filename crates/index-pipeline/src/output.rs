use index_core::{IndexError, IndexResult, ScoredRecord};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

const ROLE: &str = "output table";

/// Header of the exported table, in column order.
pub const COLUMNS: &[&str] = &[
    "code",
    "level",
    "name",
    "year",
    "is_forecast",
    "revenue",
    "net_profit",
    "liabilities_long",
    "liabilities_short",
    "total_debt",
    "cash",
    "investment",
    "entity_count",
    "profitable_entity_count",
    "bankruptcy_count",
    "arxiv_papers",
    "net_profit_margin",
    "debt_to_revenue",
    "cash_ratio",
    "capex_intensity",
    "bankruptcy_rate",
    "dynamics_yoy",
    "share_profitable",
    "revenue_prev_year",
    "growth",
    "profitability",
    "safety",
    "liquidity",
    "stability_score",
    "transformation_score",
    "lending_score",
    "normalization",
    "status",
    "forecast_status",
];

const TEXT_COLUMNS: &[&str] = &["code", "level", "name", "is_forecast", "normalization", "status", "forecast_status"];

/// Accepts exactly the columns [`OutputRow::value`] can rank by.
pub fn check_numeric_column(column: &str) -> IndexResult<()> {
    if COLUMNS.contains(&column) && !TEXT_COLUMNS.contains(&column) {
        Ok(())
    } else {
        Err(IndexError::UnknownColumn(column.to_string()))
    }
}

/// One exported row. Ratios keep their derivation units: `bankruptcy_rate`
/// is a percentage, every other ratio a fraction, scores are 0-100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRow {
    pub code: String,
    pub level: String,
    pub name: String,
    pub year: i32,
    pub is_forecast: bool,
    pub revenue: f64,
    pub net_profit: f64,
    pub liabilities_long: f64,
    pub liabilities_short: f64,
    pub total_debt: f64,
    pub cash: f64,
    pub investment: f64,
    pub entity_count: f64,
    pub profitable_entity_count: f64,
    pub bankruptcy_count: f64,
    /// Empty when the research lookup has no value.
    pub arxiv_papers: Option<f64>,
    pub net_profit_margin: f64,
    pub debt_to_revenue: f64,
    pub cash_ratio: f64,
    pub capex_intensity: f64,
    pub bankruptcy_rate: f64,
    pub dynamics_yoy: f64,
    pub share_profitable: f64,
    pub revenue_prev_year: Option<f64>,
    pub growth: f64,
    pub profitability: f64,
    pub safety: f64,
    pub liquidity: f64,
    pub stability_score: f64,
    pub transformation_score: f64,
    pub lending_score: f64,
    pub normalization: String,
    pub status: String,
    pub forecast_status: Option<String>,
}

impl From<&ScoredRecord> for OutputRow {
    fn from(s: &ScoredRecord) -> Self {
        let r = s.record();
        let raw = &r.raw;
        let d = &s.metrics.derived;
        let sc = &s.scores;
        Self {
            code: r.code.key().to_string(),
            level: r.code.level().label().to_string(),
            name: r.name.clone(),
            year: r.year,
            is_forecast: r.is_forecast,
            revenue: raw.revenue,
            net_profit: raw.net_profit,
            liabilities_long: raw.liabilities_long,
            liabilities_short: raw.liabilities_short,
            total_debt: d.total_debt,
            cash: raw.cash,
            investment: raw.investment,
            entity_count: raw.entity_count,
            profitable_entity_count: raw.profitable_entity_count,
            bankruptcy_count: raw.bankruptcy_count,
            arxiv_papers: r.arxiv_papers.value(),
            net_profit_margin: d.net_profit_margin,
            debt_to_revenue: d.debt_to_revenue,
            cash_ratio: d.cash_ratio,
            capex_intensity: d.capex_intensity,
            bankruptcy_rate: d.bankruptcy_rate,
            dynamics_yoy: d.dynamics_yoy,
            share_profitable: d.share_profitable,
            revenue_prev_year: d.revenue_prev_year,
            growth: sc.growth,
            profitability: sc.profitability,
            safety: sc.safety,
            liquidity: sc.liquidity,
            stability_score: sc.stability_score,
            transformation_score: sc.transformation_score,
            lending_score: sc.lending_score,
            normalization: s.strategy.as_str().to_string(),
            status: s.status.as_str().to_string(),
            forecast_status: s.forecast_status.map(|f| f.as_str().to_string()),
        }
    }
}

impl OutputRow {
    /// Value of a numeric column. Text columns and unknown names are errors.
    pub fn value(&self, column: &str) -> IndexResult<Option<f64>> {
        let v = match column {
            "year" => f64::from(self.year),
            "revenue" => self.revenue,
            "net_profit" => self.net_profit,
            "liabilities_long" => self.liabilities_long,
            "liabilities_short" => self.liabilities_short,
            "total_debt" => self.total_debt,
            "cash" => self.cash,
            "investment" => self.investment,
            "entity_count" => self.entity_count,
            "profitable_entity_count" => self.profitable_entity_count,
            "bankruptcy_count" => self.bankruptcy_count,
            "arxiv_papers" => return Ok(self.arxiv_papers),
            "net_profit_margin" => self.net_profit_margin,
            "debt_to_revenue" => self.debt_to_revenue,
            "cash_ratio" => self.cash_ratio,
            "capex_intensity" => self.capex_intensity,
            "bankruptcy_rate" => self.bankruptcy_rate,
            "dynamics_yoy" => self.dynamics_yoy,
            "share_profitable" => self.share_profitable,
            "revenue_prev_year" => return Ok(self.revenue_prev_year),
            "growth" => self.growth,
            "profitability" => self.profitability,
            "safety" => self.safety,
            "liquidity" => self.liquidity,
            "stability_score" => self.stability_score,
            "transformation_score" => self.transformation_score,
            "lending_score" => self.lending_score,
            other => return Err(IndexError::UnknownColumn(other.to_string())),
        };
        Ok(Some(v))
    }

    fn sort_key(&self) -> (&str, i32, bool) {
        (&self.code, self.year, self.is_forecast)
    }
}

/// The wide output table, one row per (code, year, is_forecast).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTable {
    rows: Vec<OutputRow>,
}

impl OutputTable {
    /// Build from scored records, ordered by (code, year, is_forecast).
    pub fn from_scored(records: &[ScoredRecord]) -> Self {
        let mut rows: Vec<OutputRow> = records.iter().map(OutputRow::from).collect();
        rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { rows }
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&OutputRow) -> bool,
    {
        Self {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Descending by a numeric column; rows without a value go last and ties
    /// keep table order.
    pub fn rank_by(&self, column: &str) -> IndexResult<Self> {
        check_numeric_column(column)?;
        let mut keyed: Vec<(Option<f64>, &OutputRow)> = self
            .rows
            .iter()
            .map(|r| r.value(column).map(|v| (v, r)))
            .collect::<IndexResult<_>>()?;

        keyed.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.total_cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(Self {
            rows: keyed.into_iter().map(|(_, r)| r.clone()).collect(),
        })
    }

    pub fn top(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Write with a fixed header; `delimiter` is typically `;` or `,`.
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> IndexResult<()> {
        let mut csv = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_writer(writer);
        let csv_err = |source| IndexError::Csv { role: ROLE, source };
        csv.write_record(COLUMNS).map_err(csv_err)?;
        for row in &self.rows {
            csv.serialize(row).map_err(csv_err)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn to_delimited_string(&self, delimiter: u8) -> IndexResult<String> {
        let mut buf = Vec::new();
        self.write_delimited(&mut buf, delimiter)?;
        String::from_utf8(buf).map_err(|e| IndexError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    pub fn write_to_path(&self, path: &Path, delimiter: u8) -> IndexResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_delimited(File::create(path)?, delimiter)?;
        info!(path = %path.display(), rows = self.len(), "wrote output table");
        Ok(())
    }
}
