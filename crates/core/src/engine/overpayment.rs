use serde::{Deserialize, Serialize};

use crate::engine::money::round_currency;
use crate::engine::repayment::{monthly_rate, raw_monthly_payment, validate_terms, LoanTerms};
use crate::errors::CalcError;

/// Safety margin on the schedule walk. A well-formed schedule finishes at or
/// before `term * 12`; the slack absorbs floating-point stragglers without
/// letting a broken input loop forever.
const SCHEDULE_SLACK_MONTHS: u32 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct OverpaymentQuery {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    #[serde(default)]
    pub monthly_overpayment: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OverpaymentResult {
    pub base_monthly_payment: f64,
    pub months_to_repay: u32,
    pub total_interest: f64,
    pub interest_saved: f64,
    pub months_saved: u32,
}

/// Simulates paying a fixed extra amount each month on top of the
/// contractual payment.
///
/// The walk uses the unrounded base payment so penny rounding cannot drift
/// the balance. Savings are measured against a zero-overpayment walk of the
/// same loan rather than the closed-form totals, so the two schedules differ
/// only by the overpayment itself.
pub fn simulate_overpayment(query: &OverpaymentQuery) -> Result<OverpaymentResult, CalcError> {
    let terms = LoanTerms {
        principal: query.principal,
        annual_rate_percent: query.annual_rate_percent,
        term_years: query.term_years,
    };
    validate_terms(&terms)?;
    if !query.monthly_overpayment.is_finite() || query.monthly_overpayment < 0.0 {
        return Err(CalcError::invalid(
            "monthly_overpayment",
            "Overpayment cannot be negative",
        ));
    }

    let baseline = walk_schedule(&terms, 0.0);
    let with_overpayment = walk_schedule(&terms, query.monthly_overpayment);

    Ok(OverpaymentResult {
        base_monthly_payment: round_currency(with_overpayment.base_payment),
        months_to_repay: with_overpayment.months,
        total_interest: round_currency(with_overpayment.total_interest),
        interest_saved: round_currency(baseline.total_interest - with_overpayment.total_interest),
        months_saved: baseline.months.saturating_sub(with_overpayment.months),
    })
}

struct ScheduleOutcome {
    base_payment: f64,
    months: u32,
    total_interest: f64,
}

fn walk_schedule(terms: &LoanTerms, overpayment: f64) -> ScheduleOutcome {
    let rate = monthly_rate(terms.annual_rate_percent);
    let total_months = terms.term_years * 12;
    let base_payment =
        raw_monthly_payment(terms.principal, rate, f64::from(total_months));

    let mut balance = terms.principal;
    let mut total_interest = 0.0;
    let mut months = 0u32;

    while balance > 0.01 && months < total_months + SCHEDULE_SLACK_MONTHS {
        months += 1;
        let interest = balance * rate;
        let principal_portion = (base_payment - interest + overpayment).min(balance);
        total_interest += interest;
        balance -= principal_portion;
    }

    ScheduleOutcome { base_payment, months, total_interest }
}
