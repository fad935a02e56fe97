//! Scoring and forecasting configuration.
//!
//! Every scoring call receives its configuration explicitly; nothing here is
//! read from ambient state.

use crate::error::{IndexError, IndexResult};
use crate::types::{Metric, RawField};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Relative weights of the three Stability sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityWeights {
    pub growth: f64,
    pub profitability: f64,
    pub safety: f64,
}

impl Default for StabilityWeights {
    fn default() -> Self {
        Self {
            growth: 4.0,
            profitability: 6.0,
            safety: 3.0,
        }
    }
}

impl StabilityWeights {
    /// Weights clamped at zero and divided by their sum.
    ///
    /// A zero total divides by 1 instead, so every sub-score is ignored and
    /// the composite comes out as 0.
    pub fn normalized(&self) -> [f64; 3] {
        renormalize([self.growth, self.profitability, self.safety])
    }
}

/// Capex / research split of the Transformation score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationWeights {
    pub capex: f64,
    pub research: f64,
}

/// Fixed 50/50 split used unless a caller overrides it.
pub const DEFAULT_TRANSFORMATION_WEIGHTS: TransformationWeights = TransformationWeights {
    capex: 0.5,
    research: 0.5,
};

impl Default for TransformationWeights {
    fn default() -> Self {
        DEFAULT_TRANSFORMATION_WEIGHTS
    }
}

impl TransformationWeights {
    pub fn normalized(&self) -> [f64; 2] {
        renormalize([self.capex, self.research])
    }
}

/// Blend of the Lending Opportunity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingBlend {
    pub transformation: f64,
    pub stability: f64,
    pub liquidity: f64,
}

impl Default for LendingBlend {
    fn default() -> Self {
        Self {
            transformation: 0.4,
            stability: 0.4,
            liquidity: 0.2,
        }
    }
}

impl LendingBlend {
    pub fn normalized(&self) -> [f64; 3] {
        renormalize([self.transformation, self.stability, self.liquidity])
    }
}

fn renormalize<const N: usize>(weights: [f64; N]) -> [f64; N] {
    let clean = weights.map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
    let total: f64 = clean.iter().sum();
    let divisor = if total > 0.0 { total } else { 1.0 };
    clean.map(|w| w / divisor)
}

/// Plausible `[lo, hi]` range of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lo: f64,
    pub hi: f64,
}

impl Bound {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }
}

/// Hand-calibrated absolute bounds, in the units each metric is derived in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsoluteBounds {
    /// Fraction: -10% .. +20%.
    pub dynamics_yoy: Bound,
    /// Fraction.
    pub net_profit_margin: Bound,
    /// Fraction of entities reporting a profit.
    pub share_profitable: Bound,
    /// Cash over short-term liabilities.
    pub cash_ratio: Bound,
    /// Total debt over revenue.
    pub debt_to_revenue: Bound,
    /// Percent.
    pub bankruptcy_rate: Bound,
    /// Investment over revenue.
    pub capex_intensity: Bound,
    /// Paper count.
    pub arxiv_papers: Bound,
}

impl Default for AbsoluteBounds {
    fn default() -> Self {
        Self {
            dynamics_yoy: Bound::new(-0.10, 0.20),
            net_profit_margin: Bound::new(-0.05, 0.15),
            share_profitable: Bound::new(0.40, 0.90),
            cash_ratio: Bound::new(0.0, 1.5),
            debt_to_revenue: Bound::new(0.0, 4.0),
            bankruptcy_rate: Bound::new(0.0, 5.0),
            capex_intensity: Bound::new(0.0, 0.15),
            arxiv_papers: Bound::new(0.0, 5000.0),
        }
    }
}

impl AbsoluteBounds {
    pub fn get(&self, metric: Metric) -> Bound {
        match metric {
            Metric::DynamicsYoy => self.dynamics_yoy,
            Metric::NetProfitMargin => self.net_profit_margin,
            Metric::ShareProfitable => self.share_profitable,
            Metric::CashRatio => self.cash_ratio,
            Metric::DebtToRevenue => self.debt_to_revenue,
            Metric::BankruptcyRate => self.bankruptcy_rate,
            Metric::CapexIntensity => self.capex_intensity,
            Metric::ArxivPapers => self.arxiv_papers,
        }
    }
}

/// Status classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Bankruptcy rate (percent) above which a row is CRITICAL.
    pub kill_switch: f64,
    pub stability: f64,
    pub transformation: f64,
    /// Lending score above which a forecast row is a lending target.
    pub lending: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            kill_switch: 4.5,
            stability: 60.0,
            transformation: 60.0,
            lending: 60.0,
        }
    }
}

/// Everything a scoring call depends on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub stability_weights: StabilityWeights,
    pub transformation_weights: TransformationWeights,
    pub lending_blend: LendingBlend,
    pub bounds: AbsoluteBounds,
    pub thresholds: Thresholds,
}

impl ScoringConfig {
    pub fn validate(&self) -> IndexResult<()> {
        let weights = [
            ("stability_weights.growth", self.stability_weights.growth),
            ("stability_weights.profitability", self.stability_weights.profitability),
            ("stability_weights.safety", self.stability_weights.safety),
            ("transformation_weights.capex", self.transformation_weights.capex),
            ("transformation_weights.research", self.transformation_weights.research),
            ("lending_blend.transformation", self.lending_blend.transformation),
            ("lending_blend.stability", self.lending_blend.stability),
            ("lending_blend.liquidity", self.lending_blend.liquidity),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(IndexError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {w}"
                )));
            }
        }

        for metric in Metric::ALL {
            let b = self.bounds.get(metric);
            if !b.lo.is_finite() || !b.hi.is_finite() || b.lo >= b.hi {
                return Err(IndexError::InvalidConfig(format!(
                    "bounds for {} must satisfy lo < hi, got [{}, {}]",
                    metric.name(),
                    b.lo,
                    b.hi
                )));
            }
        }

        let t = &self.thresholds;
        for (name, v) in [
            ("thresholds.kill_switch", t.kill_switch),
            ("thresholds.stability", t.stability),
            ("thresholds.transformation", t.transformation),
            ("thresholds.lending", t.lending),
        ] {
            if !v.is_finite() {
                return Err(IndexError::InvalidConfig(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}

/// Restricts the years a field is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingWindow {
    pub field: RawField,
    /// First year (inclusive) admitted into the fit.
    pub first_year: i32,
}

/// Forecast horizon and per-field training overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon: u32,
    /// Field whose projected years become the skeleton for every other field.
    pub anchor: RawField,
    pub windows: Vec<TrainingWindow>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: 2,
            anchor: RawField::Revenue,
            // Research output sits near zero until the current collection
            // regime starts; earlier years flatten the fit.
            windows: vec![TrainingWindow {
                field: RawField::ArxivPapers,
                first_year: 2019,
            }],
        }
    }
}

impl ForecastConfig {
    pub fn window_for(&self, field: RawField) -> Option<TrainingWindow> {
        self.windows.iter().copied().find(|w| w.field == field)
    }

    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn validate(&self) -> IndexResult<()> {
        if self.horizon > MAX_FORECAST_HORIZON {
            return Err(IndexError::InvalidConfig(format!(
                "forecast.horizon must be at most {MAX_FORECAST_HORIZON} years, got {}",
                self.horizon
            )));
        }
        Ok(())
    }
}

/// Longest forecast horizon, in years, a pipeline accepts.
pub const MAX_FORECAST_HORIZON: u32 = 100;

/// Scoring plus forecasting configuration, loadable from one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scoring: ScoringConfig,
    pub forecast: ForecastConfig,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> IndexResult<Self> {
        let config: PipelineConfig = serde_json::from_str(text).map_err(|source| IndexError::Json {
            role: "pipeline config",
            source,
        })?;
        config.scoring.validate()?;
        config.forecast.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::MissingSourceFile {
                role: "pipeline config",
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
