use serde::{Deserialize, Serialize};

use crate::engine::money::round_currency;
use crate::engine::repayment::{monthly_rate, raw_monthly_payment, MAX_TERM_YEARS};
use crate::engine::stamp_duty::{compute_stamp_duty, StampDutyQuery};
use crate::errors::CalcError;

/// Lenders stress-test the interest-only payment at this rate or the offered
/// rate, whichever is higher.
pub const STRESS_TEST_RATE: f64 = 5.5;

/// Rent must cover the stressed payment by this ratio (145% ICR).
pub const INTEREST_COVERAGE_REQUIREMENT: f64 = 1.45;

/// Flat allowance for survey, broker and legal costs on a purchase.
pub const TYPICAL_PURCHASE_FEES: f64 = 3_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct BuyToLetQuery {
    pub property_value: f64,
    pub deposit: f64,
    pub annual_rate_percent: f64,
    pub monthly_rent: f64,
    /// Most landlord mortgages are interest-only; repayment is the opt-in.
    #[serde(default = "default_interest_only")]
    pub interest_only: bool,
    #[serde(default = "default_term_years")]
    pub term_years: u32,
}

fn default_interest_only() -> bool {
    true
}

fn default_term_years() -> u32 {
    25
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BuyToLetResult {
    pub loan_amount: f64,
    /// Loan to value, whole percent.
    pub ltv: f64,
    pub monthly_payment: f64,
    pub monthly_rental_yield: f64,
    pub annual_rental_yield: f64,
    /// Rent over payment, whole percent. Zero when the payment is zero.
    pub interest_coverage_ratio: f64,
    /// Rent needed to pass the 145% cover test at the stressed rate.
    pub minimum_rent_required: f64,
    pub monthly_cashflow: f64,
    /// Stamp duty including the additional-property surcharge, whole pounds.
    pub stamp_duty: f64,
    /// Deposit plus stamp duty plus typical purchase fees, whole pounds.
    pub total_initial_costs: f64,
}

/// Sizes up a rental purchase: payment, yield, lender stress test and the
/// cash needed to complete.
///
/// The payment is interest-only by default, or the standard amortizing
/// payment when `interest_only` is false. Stamp duty always includes the
/// additional-property surcharge; a landlord purchase is never a main
/// residence. Ratio and up-front figures are rounded to whole units, money
/// flows to two decimal places.
pub fn analyze_buy_to_let(query: &BuyToLetQuery) -> Result<BuyToLetResult, CalcError> {
    if !query.property_value.is_finite() || query.property_value <= 0.0 {
        return Err(CalcError::invalid("property_value", "Property value must be positive"));
    }
    if !query.deposit.is_finite() || query.deposit < 0.0 {
        return Err(CalcError::invalid("deposit", "Deposit cannot be negative"));
    }
    if query.deposit >= query.property_value {
        return Err(CalcError::invalid(
            "deposit",
            "Deposit must be less than the property value",
        ));
    }
    if !query.annual_rate_percent.is_finite() || query.annual_rate_percent < 0.0 {
        return Err(CalcError::invalid("annual_rate", "Interest rate cannot be negative"));
    }
    if !query.monthly_rent.is_finite() || query.monthly_rent < 0.0 {
        return Err(CalcError::invalid("monthly_rent", "Monthly rent cannot be negative"));
    }
    if query.term_years == 0 {
        return Err(CalcError::invalid("term_years", "Term must be positive"));
    }
    if query.term_years > MAX_TERM_YEARS {
        return Err(CalcError::invalid("term_years", "Term cannot exceed 100 years"));
    }

    let loan_amount = query.property_value - query.deposit;
    let rate = monthly_rate(query.annual_rate_percent);
    let monthly_payment = if query.interest_only {
        loan_amount * rate
    } else {
        raw_monthly_payment(loan_amount, rate, f64::from(query.term_years * 12))
    };

    let annual_rental_yield = query.monthly_rent * 12.0 / query.property_value * 100.0;
    let interest_coverage_ratio = if monthly_payment > 0.0 {
        (query.monthly_rent / monthly_payment * 100.0).round_ties_even()
    } else {
        0.0
    };

    let stressed_rate = query.annual_rate_percent.max(STRESS_TEST_RATE);
    let stressed_payment = loan_amount * monthly_rate(stressed_rate);
    let minimum_rent_required = (stressed_payment * INTEREST_COVERAGE_REQUIREMENT).round_ties_even();

    let duty = compute_stamp_duty(&StampDutyQuery {
        property_value: query.property_value,
        is_first_time_buyer: false,
        is_additional_property: true,
    })?;
    let stamp_duty = duty.stamp_duty.round_ties_even();
    let total_initial_costs =
        (query.deposit + stamp_duty + TYPICAL_PURCHASE_FEES).round_ties_even();

    Ok(BuyToLetResult {
        loan_amount: round_currency(loan_amount),
        ltv: (loan_amount / query.property_value * 100.0).round_ties_even(),
        monthly_payment: round_currency(monthly_payment),
        monthly_rental_yield: round_currency(annual_rental_yield / 12.0),
        annual_rental_yield: round_currency(annual_rental_yield),
        interest_coverage_ratio,
        minimum_rent_required,
        monthly_cashflow: round_currency(query.monthly_rent - monthly_payment),
        stamp_duty,
        total_initial_costs,
    })
}
