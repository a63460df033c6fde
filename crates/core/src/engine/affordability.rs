use serde::{Deserialize, Serialize};

use crate::engine::money::round_currency;
use crate::errors::CalcError;

/// Lenders commonly cap lending at 4 to 4.5 times gross income.
const MAX_INCOME_MULTIPLIER: f64 = 4.5;
const STANDARD_INCOME_MULTIPLIER: f64 = 4.0;

pub const AFFORDABILITY_NOTE: &str =
    "These are estimates. Actual affordability depends on credit history, other factors.";

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct AffordabilityQuery {
    pub annual_income: f64,
    #[serde(default)]
    pub monthly_outgoings: f64,
    #[serde(default)]
    pub deposit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AffordabilityResult {
    pub annual_income: f64,
    pub deposit: f64,
    pub max_mortgage: f64,
    pub standard_mortgage: f64,
    pub max_property_price: f64,
    pub standard_property_price: f64,
    pub note: &'static str,
}

/// Income-multiple affordability estimate.
///
/// Regular outgoings reduce both ceilings by a rough debt-to-income
/// adjustment of four years' worth of payments, floored at zero. Property
/// price ceilings add the deposit on top of the borrowable amount.
pub fn estimate_affordability(query: &AffordabilityQuery) -> Result<AffordabilityResult, CalcError> {
    if !query.annual_income.is_finite() || query.annual_income <= 0.0 {
        return Err(CalcError::invalid("annual_income", "Annual income must be positive"));
    }

    let mut max_mortgage = query.annual_income * MAX_INCOME_MULTIPLIER;
    let mut standard_mortgage = query.annual_income * STANDARD_INCOME_MULTIPLIER;

    if query.monthly_outgoings > 0.0 {
        let debt_reduction = query.monthly_outgoings * 12.0 * 4.0;
        max_mortgage = (max_mortgage - debt_reduction).max(0.0);
        standard_mortgage = (standard_mortgage - debt_reduction).max(0.0);
    }

    Ok(AffordabilityResult {
        annual_income: query.annual_income,
        deposit: query.deposit,
        max_mortgage: round_currency(max_mortgage),
        standard_mortgage: round_currency(standard_mortgage),
        max_property_price: round_currency(max_mortgage + query.deposit),
        standard_property_price: round_currency(standard_mortgage + query.deposit),
        note: AFFORDABILITY_NOTE,
    })
}
