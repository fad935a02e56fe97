//! Weighted composite scores.
//!
//! Inputs are normalized to [0, 1]; weights are clamped at zero and divided
//! by their sum, so every composite stays within [0, 100].

use index_core::stats::mean;
use index_core::{LendingBlend, StabilityWeights, TransformationWeights};
use serde::{Deserialize, Serialize};

/// Normalized metric values for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInputs {
    pub dynamics_yoy: f64,
    pub net_profit_margin: f64,
    pub share_profitable: f64,
    pub cash_ratio: f64,
    pub debt_to_revenue: f64,
    pub bankruptcy_rate: f64,
    pub capex_intensity: f64,
    /// `None` when research output is unavailable for the row.
    pub arxiv_papers: Option<f64>,
}

/// Stability sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub growth: f64,
    pub profitability: f64,
    pub safety: f64,
}

pub fn sub_scores(inputs: &NormalizedInputs) -> SubScores {
    SubScores {
        growth: inputs.dynamics_yoy,
        profitability: mean(&[inputs.net_profit_margin, inputs.share_profitable]),
        // lower debt and lower bankruptcy risk are better
        safety: mean(&[
            inputs.cash_ratio,
            1.0 - inputs.debt_to_revenue,
            1.0 - inputs.bankruptcy_rate,
        ]),
    }
}

pub fn stability_score(sub: &SubScores, weights: &StabilityWeights) -> f64 {
    let [g, p, s] = weights.normalized();
    to_score(g * sub.growth + p * sub.profitability + s * sub.safety)
}

/// Capex intensity blended with research output.
///
/// When research output is unavailable the capex term carries the whole
/// score instead of treating the gap as zero.
pub fn transformation_score(capex: f64, research: Option<f64>, weights: &TransformationWeights) -> f64 {
    let [wc, wr] = weights.normalized();
    match research {
        Some(r) => to_score(wc * capex + wr * r),
        None if wc > 0.0 => to_score(capex),
        None => 0.0,
    }
}

/// Blend of a forward-looking transformation estimate, stability and liquidity.
///
/// `forecast_transformation` falls back to `current_transformation` when the
/// caller has no forecast. Scores are on the 0-100 scale, `liquidity` on 0-1.
pub fn lending_score(
    forecast_transformation: Option<f64>,
    current_transformation: f64,
    stability: f64,
    liquidity: f64,
    blend: &LendingBlend,
) -> f64 {
    let transformation = forecast_transformation.unwrap_or(current_transformation);
    let [bt, bs, bl] = blend.normalized();
    let unit = bt * transformation / 100.0 + bs * stability / 100.0 + bl * liquidity;
    to_score(unit)
}

fn to_score(unit: f64) -> f64 {
    if unit.is_nan() {
        return 0.0;
    }
    (unit * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform(v: f64) -> NormalizedInputs {
        NormalizedInputs {
            dynamics_yoy: v,
            net_profit_margin: v,
            share_profitable: v,
            cash_ratio: v,
            debt_to_revenue: 1.0 - v,
            bankruptcy_rate: 1.0 - v,
            capex_intensity: v,
            arxiv_papers: Some(v),
        }
    }

    #[test]
    fn test_safety_inverts_debt_and_risk() {
        let inputs = NormalizedInputs {
            cash_ratio: 1.0,
            debt_to_revenue: 0.0,
            bankruptcy_rate: 0.0,
            ..Default::default()
        };
        assert_relative_eq!(sub_scores(&inputs).safety, 1.0, epsilon = 1e-9);

        let risky = NormalizedInputs {
            cash_ratio: 0.0,
            debt_to_revenue: 1.0,
            bankruptcy_rate: 1.0,
            ..Default::default()
        };
        assert_relative_eq!(sub_scores(&risky).safety, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_default_stability_weighting() {
        let sub = SubScores {
            growth: 1.0,
            profitability: 0.0,
            safety: 0.0,
        };
        assert_relative_eq!(stability_score(&sub, &StabilityWeights::default()), 400.0 / 13.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_total_weight_scores_zero() {
        let weights = StabilityWeights {
            growth: 0.0,
            profitability: 0.0,
            safety: 0.0,
        };
        let sub = sub_scores(&uniform(1.0));
        assert_eq!(stability_score(&sub, &weights), 0.0);

        let no_transformation = TransformationWeights {
            capex: 0.0,
            research: 0.0,
        };
        assert_eq!(transformation_score(1.0, Some(1.0), &no_transformation), 0.0);
        assert_eq!(transformation_score(1.0, None, &no_transformation), 0.0);

        let no_lending = LendingBlend {
            transformation: 0.0,
            stability: 0.0,
            liquidity: 0.0,
        };
        assert_eq!(lending_score(Some(100.0), 100.0, 100.0, 1.0, &no_lending), 0.0);
    }

    #[test]
    fn test_composites_stay_in_range_for_any_weights() {
        let weight_grid = [0.0, 0.3, 1.0, 7.0, 250.0];
        for &v in &[0.0, 0.25, 0.5, 1.0] {
            let inputs = uniform(v);
            let sub = sub_scores(&inputs);
            for &g in &weight_grid {
                for &p in &weight_grid {
                    for &s in &weight_grid {
                        let score = stability_score(
                            &sub,
                            &StabilityWeights {
                                growth: g,
                                profitability: p,
                                safety: s,
                            },
                        );
                        assert!((0.0..=100.0).contains(&score));
                    }
                }
                let t = transformation_score(
                    inputs.capex_intensity,
                    inputs.arxiv_papers,
                    &TransformationWeights { capex: g, research: 1.0 },
                );
                assert!((0.0..=100.0).contains(&t));
            }
        }
    }

    #[test]
    fn test_transformation_even_split() {
        let t = transformation_score(0.2, Some(0.6), &TransformationWeights::default());
        assert_relative_eq!(t, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_transformation_without_research_uses_capex_only() {
        let t = transformation_score(0.3, None, &TransformationWeights::default());
        assert_relative_eq!(t, 30.0, epsilon = 1e-9);
        let research_only = TransformationWeights {
            capex: 0.0,
            research: 1.0,
        };
        assert_eq!(transformation_score(0.3, None, &research_only), 0.0);
    }

    #[test]
    fn test_lending_blend_and_fallback() {
        let blend = LendingBlend::default();
        let with_forecast = lending_score(Some(80.0), 20.0, 50.0, 0.5, &blend);
        assert_relative_eq!(with_forecast, 0.4 * 80.0 + 0.4 * 50.0 + 0.2 * 50.0, epsilon = 1e-9);
        let fallback = lending_score(None, 20.0, 50.0, 0.5, &blend);
        assert_relative_eq!(fallback, 0.4 * 20.0 + 0.4 * 50.0 + 0.2 * 50.0, epsilon = 1e-9);
    }
}
