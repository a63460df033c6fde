use serde::Serialize;

use crate::engine::money::round_currency;
use crate::errors::CalcError;

/// Longest term the engine accepts. Terms arrive as untrusted `u32`s from
/// the tool layer; without a ceiling, `term_years * 12` overflows and the
/// schedule walk runs for billions of months.
pub const MAX_TERM_YEARS: u32 = 100;

/// Immutable input to the repayment calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoanTerms {
    /// Loan amount in GBP.
    pub principal: f64,
    /// Annual interest rate as a percentage, e.g. `4.5` for 4.5%.
    pub annual_rate_percent: f64,
    /// Loan term in whole years.
    pub term_years: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RepaymentResult {
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_paid: f64,
}

/// Fixed monthly payment for an amortizing loan, plus total cost figures.
///
/// The zero-rate case is handled explicitly as a straight-line repayment
/// (`principal / n`); the amortization formula would divide by zero there.
/// All currency outputs are rounded half-to-even at two decimal places.
pub fn compute_repayment(terms: &LoanTerms) -> Result<RepaymentResult, CalcError> {
    validate_terms(terms)?;

    let monthly_rate = monthly_rate(terms.annual_rate_percent);
    let num_payments = f64::from(terms.term_years * 12);
    let monthly_payment = raw_monthly_payment(terms.principal, monthly_rate, num_payments);

    let total_paid = monthly_payment * num_payments;
    let total_interest = total_paid - terms.principal;

    Ok(RepaymentResult {
        monthly_payment: round_currency(monthly_payment),
        total_interest: round_currency(total_interest),
        total_paid: round_currency(total_paid),
    })
}

pub(crate) fn validate_terms(terms: &LoanTerms) -> Result<(), CalcError> {
    if !terms.principal.is_finite() || terms.principal <= 0.0 {
        return Err(CalcError::invalid("principal", "Principal must be positive"));
    }
    if !terms.annual_rate_percent.is_finite() || terms.annual_rate_percent < 0.0 {
        return Err(CalcError::invalid("annual_rate", "Interest rate cannot be negative"));
    }
    if terms.term_years == 0 {
        return Err(CalcError::invalid("term_years", "Term must be positive"));
    }
    if terms.term_years > MAX_TERM_YEARS {
        return Err(CalcError::invalid("term_years", "Term cannot exceed 100 years"));
    }
    Ok(())
}

pub(crate) fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

/// The unrounded payment; the overpayment simulator walks schedules with
/// this value so penny rounding cannot drift the balance.
pub(crate) fn raw_monthly_payment(principal: f64, monthly_rate: f64, num_payments: f64) -> f64 {
    if monthly_rate == 0.0 {
        principal / num_payments
    } else {
        let growth = (1.0 + monthly_rate).powf(num_payments);
        principal * monthly_rate * growth / (growth - 1.0)
    }
}
