use crate::composite::{lending_score, stability_score, sub_scores, transformation_score, NormalizedInputs};
use crate::normalize::CohortNormalizer;
use crate::status::{classify, classify_forecast};
use index_core::{Metric, MetricRecord, NormalizationStrategy, ScoreBreakdown, ScoredRecord, ScoringConfig, Status};

/// Applies one [`ScoringConfig`] to records.
///
/// Stateless apart from the borrowed config: the same rows and config always
/// produce the same scores.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        self.config
    }

    pub fn normalizer(&self, strategy: NormalizationStrategy, cohort: &[MetricRecord]) -> CohortNormalizer {
        CohortNormalizer::new(strategy, cohort, self.config.bounds)
    }

    pub fn normalized_inputs(&self, record: &MetricRecord, normalizer: &CohortNormalizer) -> NormalizedInputs {
        let norm = |metric: Metric| normalizer.normalize(metric, record.metric(metric)).unwrap_or(0.0);
        NormalizedInputs {
            dynamics_yoy: norm(Metric::DynamicsYoy),
            net_profit_margin: norm(Metric::NetProfitMargin),
            share_profitable: norm(Metric::ShareProfitable),
            cash_ratio: norm(Metric::CashRatio),
            debt_to_revenue: norm(Metric::DebtToRevenue),
            bankruptcy_rate: norm(Metric::BankruptcyRate),
            capex_intensity: norm(Metric::CapexIntensity),
            arxiv_papers: normalizer.normalize(Metric::ArxivPapers, record.metric(Metric::ArxivPapers)),
        }
    }

    /// Score one record against an already-built normalizer.
    pub fn score_record(&self, record: MetricRecord, normalizer: &CohortNormalizer) -> ScoredRecord {
        let inputs = self.normalized_inputs(&record, normalizer);
        let sub = sub_scores(&inputs);
        let stability = stability_score(&sub, &self.config.stability_weights);
        let transformation = transformation_score(
            inputs.capex_intensity,
            inputs.arxiv_papers,
            &self.config.transformation_weights,
        );
        let lending = lending_score(
            None,
            transformation,
            stability,
            inputs.cash_ratio,
            &self.config.lending_blend,
        );

        let scores = ScoreBreakdown {
            growth: sub.growth,
            profitability: sub.profitability,
            safety: sub.safety,
            liquidity: inputs.cash_ratio,
            stability_score: stability,
            transformation_score: transformation,
            lending_score: lending,
        };

        let mut scored = ScoredRecord {
            metrics: record,
            scores,
            strategy: normalizer.strategy(),
            status: Status::Neutral,
            forecast_status: None,
        };
        self.reclassify(&mut scored);
        scored
    }

    /// Score a cohort. Relative ranges are measured over exactly these rows.
    pub fn score_cohort(&self, cohort: Vec<MetricRecord>, strategy: NormalizationStrategy) -> Vec<ScoredRecord> {
        let normalizer = self.normalizer(strategy, &cohort);
        cohort
            .into_iter()
            .map(|record| self.score_record(record, &normalizer))
            .collect()
    }

    /// Re-blend the lending score with an externally supplied forecast
    /// transformation score.
    pub fn apply_forecast_transformation(&self, scored: &mut ScoredRecord, forecast_transformation: f64) {
        let s = &mut scored.scores;
        s.lending_score = lending_score(
            Some(forecast_transformation),
            s.transformation_score,
            s.stability_score,
            s.liquidity,
            &self.config.lending_blend,
        );
        self.reclassify(scored);
    }

    fn reclassify(&self, scored: &mut ScoredRecord) {
        let thresholds = &self.config.thresholds;
        let rate = scored.metrics.derived.bankruptcy_rate;
        let s = &scored.scores;
        scored.status = classify(rate, s.stability_score, s.transformation_score, thresholds);
        scored.forecast_status = scored.metrics.record.is_forecast.then(|| {
            classify_forecast(
                rate,
                s.stability_score,
                s.transformation_score,
                s.lending_score,
                thresholds,
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use index_core::{
        Availability, CodeLevel, DerivedMetrics, ForecastStatus, IndustryCode, IndustryRecord, RawAggregates, Status,
    };

    fn metric_record(code: &str, derived: DerivedMetrics, arxiv: Option<f64>) -> MetricRecord {
        let mut record = IndustryRecord::historical(
            IndustryCode::new(code, CodeLevel::Division),
            code,
            2024,
            RawAggregates::default(),
        );
        record.arxiv_papers = Availability::from_option(arxiv);
        MetricRecord { record, derived }
    }

    fn healthy() -> DerivedMetrics {
        DerivedMetrics {
            dynamics_yoy: 0.20,
            net_profit_margin: 0.15,
            share_profitable: 0.90,
            cash_ratio: 1.5,
            debt_to_revenue: 0.0,
            bankruptcy_rate: 0.0,
            capex_intensity: 0.15,
            ..Default::default()
        }
    }

    #[test]
    fn test_absolute_best_case_scores_hundred() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let scored = scorer.score_cohort(
            vec![metric_record("62", healthy(), Some(5000.0))],
            NormalizationStrategy::Absolute,
        );
        assert_relative_eq!(scored[0].scores.stability_score, 100.0, epsilon = 1e-9);
        assert_relative_eq!(scored[0].scores.transformation_score, 100.0, epsilon = 1e-9);
        assert_eq!(scored[0].status, Status::Opportunity);
        assert_eq!(scored[0].forecast_status, None);
    }

    #[test]
    fn test_absolute_score_independent_of_cohort() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let target = metric_record("41", healthy(), Some(100.0));
        let alone = scorer.score_cohort(vec![target.clone()], NormalizationStrategy::Absolute);
        let mut weak = healthy();
        weak.dynamics_yoy = -0.5;
        let crowd = scorer.score_cohort(
            vec![target, metric_record("42", weak, Some(4000.0))],
            NormalizationStrategy::Absolute,
        );
        assert_eq!(alone[0].scores, crowd[0].scores);
    }

    #[test]
    fn test_relative_single_row_cohort_is_neutral() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let scored = scorer.score_cohort(
            vec![metric_record("41", healthy(), None)],
            NormalizationStrategy::Relative,
        );
        let s = scored[0].scores;
        assert_relative_eq!(s.growth, 0.5, epsilon = 1e-9);
        assert_relative_eq!(s.stability_score, 50.0, epsilon = 1e-9);
        assert_relative_eq!(s.transformation_score, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_forecast_rows_get_forecast_status() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut record = metric_record("41", healthy(), Some(5000.0));
        record.record.is_forecast = true;
        let scored = scorer.score_cohort(vec![record], NormalizationStrategy::Absolute);
        assert_eq!(scored[0].forecast_status, Some(ForecastStatus::FutureLeader));
    }

    #[test]
    fn test_apply_forecast_transformation_updates_lending() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut weak = healthy();
        weak.capex_intensity = 0.0;
        let mut scored = scorer
            .score_cohort(vec![metric_record("41", weak, Some(0.0))], NormalizationStrategy::Absolute)
            .remove(0);
        let before = scored.scores.lending_score;
        scorer.apply_forecast_transformation(&mut scored, 100.0);
        assert_relative_eq!(scored.scores.lending_score - before, 40.0, epsilon = 1e-9);
    }
}
