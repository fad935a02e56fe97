//! Status labels, re-evaluated from scratch on every call.
//!
//! The risk gate always runs first; after it, rules are tried in a fixed
//! order and the first match wins.

use index_core::{ForecastStatus, Status, Thresholds};

/// CRITICAL above the kill switch, OPPORTUNITY when both scores clear their
/// thresholds, NEUTRAL otherwise.
pub fn classify(bankruptcy_rate: f64, stability: f64, transformation: f64, thresholds: &Thresholds) -> Status {
    if bankruptcy_rate > thresholds.kill_switch {
        Status::Critical
    } else if stability > thresholds.stability && transformation > thresholds.transformation {
        Status::Opportunity
    } else {
        Status::Neutral
    }
}

struct ForecastInputs {
    bankruptcy_rate: f64,
    stability: f64,
    transformation: f64,
    lending: f64,
}

type Rule = (ForecastStatus, fn(&ForecastInputs, &Thresholds) -> bool);

fn at_risk(i: &ForecastInputs, t: &Thresholds) -> bool {
    i.bankruptcy_rate > t.kill_switch
}

fn leads_both(i: &ForecastInputs, t: &Thresholds) -> bool {
    i.stability > t.stability && i.transformation > t.transformation
}

fn transforming(i: &ForecastInputs, t: &Thresholds) -> bool {
    i.transformation > t.transformation
}

fn stable(i: &ForecastInputs, t: &Thresholds) -> bool {
    i.stability > t.stability
}

fn lendable(i: &ForecastInputs, t: &Thresholds) -> bool {
    i.lending > t.lending
}

const FORECAST_RULES: &[Rule] = &[
    (ForecastStatus::Critical, at_risk),
    (ForecastStatus::FutureLeader, leads_both),
    (ForecastStatus::RisingStar, transforming),
    (ForecastStatus::SafeHaven, stable),
    (ForecastStatus::LendingTarget, lendable),
];

/// Forecast-year label over forecast-year risk and scores.
pub fn classify_forecast(
    bankruptcy_rate: f64,
    stability: f64,
    transformation: f64,
    lending: f64,
    thresholds: &Thresholds,
) -> ForecastStatus {
    let inputs = ForecastInputs {
        bankruptcy_rate,
        stability,
        transformation,
        lending,
    };
    FORECAST_RULES
        .iter()
        .find(|(_, applies)| applies(&inputs, thresholds))
        .map(|(label, _)| *label)
        .unwrap_or(ForecastStatus::Neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_gate_dominates() {
        let t = Thresholds::default();
        assert_eq!(classify(5.0, 90.0, 90.0, &t), Status::Critical);
        assert_eq!(classify_forecast(5.0, 90.0, 90.0, 90.0, &t), ForecastStatus::Critical);
    }

    #[test]
    fn test_kill_switch_is_strict_inequality() {
        let t = Thresholds::default();
        assert_eq!(classify(4.5, 90.0, 90.0, &t), Status::Opportunity);
    }

    #[test]
    fn test_opportunity_requires_both_scores() {
        let t = Thresholds::default();
        assert_eq!(classify(1.0, 61.0, 61.0, &t), Status::Opportunity);
        assert_eq!(classify(1.0, 61.0, 60.0, &t), Status::Neutral);
        assert_eq!(classify(1.0, 10.0, 99.0, &t), Status::Neutral);
    }

    #[test]
    fn test_configurable_kill_switch() {
        let t = Thresholds {
            kill_switch: 2.0,
            ..Default::default()
        };
        assert_eq!(classify(2.5, 10.0, 10.0, &t), Status::Critical);
    }

    #[test]
    fn test_forecast_rule_order() {
        let t = Thresholds::default();
        assert_eq!(classify_forecast(1.0, 70.0, 70.0, 90.0, &t), ForecastStatus::FutureLeader);
        assert_eq!(classify_forecast(1.0, 50.0, 70.0, 90.0, &t), ForecastStatus::RisingStar);
        assert_eq!(classify_forecast(1.0, 70.0, 50.0, 90.0, &t), ForecastStatus::SafeHaven);
        assert_eq!(classify_forecast(1.0, 50.0, 50.0, 65.0, &t), ForecastStatus::LendingTarget);
        assert_eq!(classify_forecast(1.0, 50.0, 50.0, 50.0, &t), ForecastStatus::Neutral);
    }
}
