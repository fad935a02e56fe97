use crate::cohort::CohortFilter;
use crate::output::{check_numeric_column, OutputRow, OutputTable};
use data_ingest::{assemble, load_sources, CommentaryCache, SourcePaths, SourceTables};
use index_core::{
    CodeLevel, IndexError, IndexResult, IndustryCode, IndustryRecord, MetricRecord, NormalizationStrategy,
    PipelineConfig, ScoredRecord,
};
use metric_deriver::derive_series;
use pkd_codes::{DrillNode, HierarchyTree};
use scoring_engine::Scorer;
use sector_aggregator::{section_rollup, verify_section_rollups, RollupMismatch, SectionTotal};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use trend_forecaster::forecast_all;

/// Section totals of one year with the roll-up check result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub year: i32,
    pub totals: Vec<SectionTotal>,
    pub mismatches: Vec<RollupMismatch>,
}

/// Loaded historical data plus the configuration every call runs under.
///
/// Historical rows are fixed at construction; forecast rows are produced per
/// call and never stored.
pub struct IndexPipeline {
    config: PipelineConfig,
    records: Vec<IndustryRecord>,
    history: Vec<MetricRecord>,
    commentary: CommentaryCache,
}

impl IndexPipeline {
    pub fn new(config: PipelineConfig, records: Vec<IndustryRecord>) -> IndexResult<Self> {
        config.scoring.validate()?;
        config.forecast.validate()?;
        let records: Vec<IndustryRecord> = records.into_iter().filter(|r| !r.is_forecast).collect();
        let history = derive_series(records.clone());
        info!(
            rows = history.len(),
            entities = history.iter().map(|m| &m.record.code).collect::<BTreeSet<_>>().len(),
            "pipeline ready"
        );
        Ok(Self {
            config,
            records,
            history,
            commentary: CommentaryCache::default(),
        })
    }

    pub fn from_sources(config: PipelineConfig, tables: SourceTables) -> IndexResult<Self> {
        let records = assemble(&tables);
        let mut pipeline = Self::new(config, records)?;
        pipeline.commentary = tables.commentary;
        Ok(pipeline)
    }

    /// Load every source table once and build the pipeline.
    pub fn load(config: PipelineConfig, paths: &SourcePaths) -> IndexResult<Self> {
        let tables = load_sources(paths)?;
        Self::from_sources(config, tables)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &[MetricRecord] {
        &self.history
    }

    pub fn commentary(&self) -> &CommentaryCache {
        &self.commentary
    }

    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|r| r.year).max()
    }

    /// Codes with a row in `year`, or in any year.
    pub fn tree(&self, year: Option<i32>) -> HierarchyTree {
        HierarchyTree::new(
            self.records
                .iter()
                .filter(|r| year.map_or(true, |y| r.year == y))
                .map(|r| r.code.clone()),
        )
    }

    /// Relative scores: every (year, level) cohort among the rows matching
    /// `filter` is normalized against itself.
    pub fn score_relative(&self, filter: &CohortFilter) -> Vec<ScoredRecord> {
        let scorer = Scorer::new(&self.config.scoring);
        let mut cohorts: BTreeMap<(i32, CodeLevel), Vec<MetricRecord>> = BTreeMap::new();
        for m in self.history.iter().filter(|m| filter.matches(&m.record)) {
            cohorts
                .entry((m.record.year, m.record.code.level()))
                .or_default()
                .push(m.clone());
        }

        let mut scored = Vec::new();
        for ((year, level), cohort) in cohorts {
            let normalizer = scorer.normalizer(NormalizationStrategy::Relative, &cohort);
            let degenerate = normalizer.degenerate_metrics();
            if !degenerate.is_empty() {
                debug!(
                    year,
                    level = level.label(),
                    metrics = ?degenerate.iter().map(|m| m.name()).collect::<Vec<_>>(),
                    "degenerate cohort range, neutral 0.5 used"
                );
            }
            scored.extend(cohort.into_iter().map(|m| scorer.score_record(m, &normalizer)));
        }
        scored
    }

    /// Absolute scores of the historical rows matching `filter`.
    pub fn score_absolute(&self, filter: &CohortFilter) -> Vec<ScoredRecord> {
        let scorer = Scorer::new(&self.config.scoring);
        let rows: Vec<MetricRecord> = self
            .history
            .iter()
            .filter(|m| filter.matches(&m.record))
            .cloned()
            .collect();
        scorer.score_cohort(rows, NormalizationStrategy::Absolute)
    }

    /// Historical plus forecast rows of every entity, all scored against the
    /// absolute bounds so each series is continuous.
    pub fn score_with_forecast(&self, horizon: u32) -> IndexResult<Vec<ScoredRecord>> {
        self.score_series(&self.records, horizon)
    }

    /// One entity's continuous series. Empty when the code has no history.
    pub fn forecast_entity(&self, code: &IndustryCode, horizon: u32) -> IndexResult<Vec<ScoredRecord>> {
        let history: Vec<IndustryRecord> = self.records.iter().filter(|r| &r.code == code).cloned().collect();
        if history.is_empty() {
            warn!(code = %code, "no history for entity");
            return Ok(Vec::new());
        }
        self.score_series(&history, horizon)
    }

    fn score_series(&self, records: &[IndustryRecord], horizon: u32) -> IndexResult<Vec<ScoredRecord>> {
        let forecast_config = self.config.forecast.clone().with_horizon(horizon);
        forecast_config.validate()?;
        let forecast = forecast_all(records, &forecast_config);
        debug!(historical = records.len(), forecast = forecast.len(), horizon, "forecast rows built");

        let mut combined = records.to_vec();
        combined.extend(forecast);
        let scorer = Scorer::new(&self.config.scoring);
        let mut scored = scorer.score_cohort(derive_series(combined), NormalizationStrategy::Absolute);
        apply_forward_lending(&scorer, &mut scored);
        Ok(scored)
    }

    /// Score the whole table and build the output.
    ///
    /// With a forecast horizon every row is scored absolutely; asking for
    /// relative scores together with a horizon is rejected.
    pub fn run(&self, strategy: NormalizationStrategy) -> IndexResult<OutputTable> {
        let horizon = self.config.forecast.horizon;
        let scored = match (strategy, horizon) {
            (NormalizationStrategy::Relative, 0) => self.score_relative(&CohortFilter::all()),
            (NormalizationStrategy::Absolute, 0) => self.score_absolute(&CohortFilter::all()),
            (NormalizationStrategy::Absolute, h) => self.score_with_forecast(h)?,
            (NormalizationStrategy::Relative, h) => {
                return Err(IndexError::InvalidConfig(format!(
                    "relative normalization cannot span a forecast horizon of {h}; use absolute"
                )))
            }
        };
        let table = OutputTable::from_scored(&scored);
        info!(
            rows = table.len(),
            strategy = strategy.as_str(),
            horizon,
            "scored output table"
        );
        Ok(table)
    }

    /// Hierarchy below `code` among the codes present in `year`.
    pub fn drill(&self, code: &IndustryCode, year: i32, depth: usize) -> Option<DrillNode> {
        self.tree(Some(year)).subtree(code, depth)
    }

    /// Walk down from `code`, following the child with the highest `column`
    /// value in the relative view of `year`.
    pub fn drill_path(&self, code: &IndustryCode, year: i32, depth: usize, column: &str) -> IndexResult<Vec<OutputRow>> {
        check_numeric_column(column)?;
        let table = OutputTable::from_scored(&self.score_relative(&CohortFilter::year(year)));

        let rows: BTreeMap<&str, &OutputRow> = table.rows().iter().map(|r| (r.code.as_str(), r)).collect();
        let value_of = |c: &IndustryCode| {
            rows.get(c.key())
                .and_then(|r| r.value(column).ok().flatten())
                .unwrap_or(f64::NEG_INFINITY)
        };

        let path = self.tree(Some(year)).descend(code, depth, |_, children| {
            children
                .iter()
                .fold(None::<&IndustryCode>, |best, c| match best {
                    Some(b) if value_of(b) >= value_of(c) => Some(b),
                    _ => Some(c),
                })
                .cloned()
        });

        Ok(path
            .iter()
            .filter_map(|c| rows.get(c.key()).map(|r| (*r).clone()))
            .collect())
    }

    /// Section totals rolled up from divisions, with the consistency check
    /// against the loaded section rows.
    pub fn sections(&self, year: i32, tolerance: f64) -> SectionReport {
        let rows: Vec<MetricRecord> = self.history.iter().filter(|m| m.record.year == year).cloned().collect();
        let mismatches = verify_section_rollups(&rows, tolerance);
        if !mismatches.is_empty() {
            warn!(year, mismatches = mismatches.len(), "section roll-up mismatches");
        }
        SectionReport {
            year,
            totals: section_rollup(&rows),
            mismatches,
        }
    }
}

/// The last historical row of each entity gets a lending score built on the
/// transformation score of its final forecast year.
fn apply_forward_lending(scorer: &Scorer<'_>, scored: &mut [ScoredRecord]) {
    let mut last_historical: BTreeMap<IndustryCode, usize> = BTreeMap::new();
    let mut final_forecast: BTreeMap<IndustryCode, (i32, f64)> = BTreeMap::new();
    for (i, s) in scored.iter().enumerate() {
        let r = s.record();
        if r.is_forecast {
            let entry = final_forecast.entry(r.code.clone()).or_insert((r.year, s.scores.transformation_score));
            if r.year >= entry.0 {
                *entry = (r.year, s.scores.transformation_score);
            }
        } else {
            let idx = last_historical.entry(r.code.clone()).or_insert(i);
            if scored[*idx].record().year < r.year {
                *idx = i;
            }
        }
    }

    for (code, idx) in last_historical {
        if let Some((_, transformation)) = final_forecast.get(&code) {
            scorer.apply_forecast_transformation(&mut scored[idx], *transformation);
        }
    }
}
