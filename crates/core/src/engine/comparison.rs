use serde::{Deserialize, Serialize};

use crate::engine::money::round_currency;
use crate::engine::repayment::{compute_repayment, LoanTerms};
use crate::errors::CalcError;

pub const DEFAULT_PRINCIPAL: f64 = 300_000.0;
pub const DEFAULT_ANNUAL_RATE: f64 = 4.5;
pub const DEFAULT_TERM_YEARS: u32 = 25;

/// One scenario as supplied by the caller. Missing fields fall back to the
/// same defaults the session state starts with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct ScenarioInput {
    #[serde(default)]
    pub principal: Option<f64>,
    #[serde(default)]
    pub annual_rate: Option<f64>,
    #[serde(default)]
    pub term_years: Option<u32>,
}

impl ScenarioInput {
    fn terms(&self) -> LoanTerms {
        LoanTerms {
            principal: self.principal.unwrap_or(DEFAULT_PRINCIPAL),
            annual_rate_percent: self.annual_rate.unwrap_or(DEFAULT_ANNUAL_RATE),
            term_years: self.term_years.unwrap_or(DEFAULT_TERM_YEARS),
        }
    }
}

/// A scored scenario. `scenario` is the 1-based position in the input list;
/// the diff fields are present on every scenario except the first and are
/// signed relative to scenario 1.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub scenario: usize,
    pub principal: f64,
    pub annual_rate: f64,
    pub term_years: u32,
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_paid: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_diff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_interest_diff: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub scenarios: Vec<ScenarioResult>,
    pub cheapest_monthly: ScenarioResult,
    pub lowest_total_interest: ScenarioResult,
}

/// Compares two or more repayment scenarios against the first one.
///
/// Diffs are computed on the rounded figures, so they line up exactly with
/// the per-scenario numbers the caller sees. Winner selection is a stable
/// minimum: on a tie the earlier scenario keeps the title.
pub fn compare_scenarios(scenarios: &[ScenarioInput]) -> Result<ComparisonResult, CalcError> {
    if scenarios.len() < 2 {
        return Err(CalcError::InsufficientScenarios { provided: scenarios.len() });
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for (index, scenario) in scenarios.iter().enumerate() {
        let terms = scenario.terms();
        let repayment = compute_repayment(&terms)?;
        results.push(ScenarioResult {
            scenario: index + 1,
            principal: terms.principal,
            annual_rate: terms.annual_rate_percent,
            term_years: terms.term_years,
            monthly_payment: repayment.monthly_payment,
            total_interest: repayment.total_interest,
            total_paid: repayment.total_paid,
            monthly_diff: None,
            total_interest_diff: None,
        });
    }

    let baseline_monthly = results[0].monthly_payment;
    let baseline_interest = results[0].total_interest;
    for result in &mut results[1..] {
        result.monthly_diff = Some(round_currency(result.monthly_payment - baseline_monthly));
        result.total_interest_diff =
            Some(round_currency(result.total_interest - baseline_interest));
    }

    let cheapest_monthly = stable_min_by(&results, |r| r.monthly_payment).clone();
    let lowest_total_interest = stable_min_by(&results, |r| r.total_interest).clone();

    Ok(ComparisonResult { scenarios: results, cheapest_monthly, lowest_total_interest })
}

fn stable_min_by(results: &[ScenarioResult], key: impl Fn(&ScenarioResult) -> f64) -> &ScenarioResult {
    let mut best = &results[0];
    for candidate in &results[1..] {
        if key(candidate) < key(best) {
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{compare_scenarios, ScenarioInput};
    use crate::errors::CalcError;

    fn scenario(principal: f64, rate: f64, years: u32) -> ScenarioInput {
        ScenarioInput {
            principal: Some(principal),
            annual_rate: Some(rate),
            term_years: Some(years),
        }
    }

    #[test]
    fn rejects_fewer_than_two_scenarios() {
        let error = compare_scenarios(&[]).expect_err("must reject");
        assert_eq!(error, CalcError::InsufficientScenarios { provided: 0 });

        let error =
            compare_scenarios(&[scenario(300_000.0, 4.5, 25)]).expect_err("must reject");
        assert_eq!(error.to_string(), "Please provide at least 2 scenarios to compare");
    }

    #[test]
    fn tags_scenarios_with_one_based_positions() {
        let result = compare_scenarios(&[
            scenario(300_000.0, 4.5, 25),
            scenario(300_000.0, 3.9, 25),
            scenario(300_000.0, 4.5, 30),
        ])
        .expect("valid scenarios");
        let tags: Vec<usize> = result.scenarios.iter().map(|s| s.scenario).collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn diffs_are_relative_to_the_first_scenario() {
        let result = compare_scenarios(&[
            scenario(300_000.0, 4.5, 25),
            scenario(300_000.0, 3.9, 25),
        ])
        .expect("valid scenarios");

        let first = &result.scenarios[0];
        let second = &result.scenarios[1];
        assert_eq!(first.monthly_diff, None);
        assert_eq!(first.total_interest_diff, None);

        let monthly_diff = second.monthly_diff.expect("diff present");
        let interest_diff = second.total_interest_diff.expect("diff present");
        // The lower rate must cost less per month and in total interest.
        assert!(monthly_diff < 0.0);
        assert!(interest_diff < 0.0);
        assert!((monthly_diff - (second.monthly_payment - first.monthly_payment)).abs() < 0.01);
        assert!((interest_diff - (second.total_interest - first.total_interest)).abs() < 0.01);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let result = compare_scenarios(&[
            ScenarioInput::default(),
            scenario(300_000.0, 4.5, 25),
        ])
        .expect("valid scenarios");
        // A fully-defaulted scenario is the same loan as the explicit one.
        assert_eq!(result.scenarios[0].principal, 300_000.0);
        assert_eq!(result.scenarios[0].annual_rate, 4.5);
        assert_eq!(result.scenarios[0].term_years, 25);
        assert_eq!(result.scenarios[0].monthly_payment, result.scenarios[1].monthly_payment);
        assert_eq!(result.scenarios[1].monthly_diff, Some(0.0));
    }

    #[test]
    fn winners_pick_the_right_scenarios() {
        // Longer term: cheaper monthly, more interest overall.
        let result = compare_scenarios(&[
            scenario(300_000.0, 4.5, 25),
            scenario(300_000.0, 4.5, 35),
        ])
        .expect("valid scenarios");
        assert_eq!(result.cheapest_monthly.scenario, 2);
        assert_eq!(result.lowest_total_interest.scenario, 1);
    }

    #[test]
    fn ties_go_to_the_earlier_scenario() {
        let result = compare_scenarios(&[
            scenario(250_000.0, 4.0, 20),
            scenario(250_000.0, 4.0, 20),
        ])
        .expect("valid scenarios");
        assert_eq!(result.cheapest_monthly.scenario, 1);
        assert_eq!(result.lowest_total_interest.scenario, 1);
    }

    #[test]
    fn invalid_scenario_inputs_propagate_the_field_error() {
        let error = compare_scenarios(&[
            scenario(300_000.0, 4.5, 25),
            scenario(-5.0, 4.5, 25),
        ])
        .expect_err("must reject");
        assert_eq!(error.to_string(), "Principal must be positive");
    }
}
