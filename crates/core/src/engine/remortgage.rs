use serde::{Deserialize, Serialize};

use crate::engine::money::round_currency;
use crate::engine::repayment::{
    monthly_rate, raw_monthly_payment, validate_terms, LoanTerms, MAX_TERM_YEARS,
};
use crate::errors::CalcError;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RemortgageQuery {
    pub outstanding_balance: f64,
    pub current_rate: f64,
    pub new_rate: f64,
    pub remaining_term_years: u32,
    pub deal_years: u32,
    #[serde(default)]
    pub arrangement_fee: f64,
    #[serde(default)]
    pub valuation_fee: f64,
    #[serde(default)]
    pub legal_fees: f64,
    #[serde(default)]
    pub early_repayment_charge: f64,
}

impl RemortgageQuery {
    fn total_fees(&self) -> f64 {
        self.arrangement_fee + self.valuation_fee + self.legal_fees + self.early_repayment_charge
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RemortgageResult {
    pub current_monthly_payment: f64,
    pub new_monthly_payment: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub total_fees: f64,
    pub total_savings_over_deal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_even_months: Option<u32>,
    pub worth_switching: bool,
}

/// Weighs switching to a new rate against the fees of doing so.
///
/// Both payments are computed over the remaining term, so the comparison
/// isolates the rate change. The verdict is net savings over the fixed deal
/// period only; what happens after the deal reverts is out of scope.
pub fn compare_remortgage(query: &RemortgageQuery) -> Result<RemortgageResult, CalcError> {
    let current_terms = LoanTerms {
        principal: query.outstanding_balance,
        annual_rate_percent: query.current_rate,
        term_years: query.remaining_term_years,
    };
    validate_terms(&current_terms)?;
    if !query.new_rate.is_finite() || query.new_rate < 0.0 {
        return Err(CalcError::invalid("new_rate", "Interest rate cannot be negative"));
    }
    if query.deal_years == 0 {
        return Err(CalcError::invalid("deal_years", "Deal period must be positive"));
    }
    if query.deal_years > MAX_TERM_YEARS {
        return Err(CalcError::invalid("deal_years", "Deal period cannot exceed 100 years"));
    }
    for (field, value) in [
        ("arrangement_fee", query.arrangement_fee),
        ("valuation_fee", query.valuation_fee),
        ("legal_fees", query.legal_fees),
        ("early_repayment_charge", query.early_repayment_charge),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(CalcError::invalid(field, "Fees cannot be negative"));
        }
    }

    let num_payments = f64::from(query.remaining_term_years * 12);
    let current_monthly = raw_monthly_payment(
        query.outstanding_balance,
        monthly_rate(query.current_rate),
        num_payments,
    );
    let new_monthly = raw_monthly_payment(
        query.outstanding_balance,
        monthly_rate(query.new_rate),
        num_payments,
    );

    let monthly_savings = current_monthly - new_monthly;
    let total_fees = query.total_fees();
    let deal_months = f64::from(query.deal_years * 12);
    let total_savings_over_deal = monthly_savings * deal_months - total_fees;

    let break_even_months = if total_fees > 0.0 && monthly_savings > 0.0 {
        Some((total_fees / monthly_savings).ceil() as u32)
    } else {
        None
    };

    Ok(RemortgageResult {
        current_monthly_payment: round_currency(current_monthly),
        new_monthly_payment: round_currency(new_monthly),
        monthly_savings: round_currency(monthly_savings),
        annual_savings: round_currency(monthly_savings * 12.0),
        total_fees: round_currency(total_fees),
        total_savings_over_deal: round_currency(total_savings_over_deal),
        break_even_months,
        worth_switching: total_savings_over_deal > 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::{compare_remortgage, RemortgageQuery};

    fn query(balance: f64, current: f64, new: f64, term: u32, deal: u32) -> RemortgageQuery {
        RemortgageQuery {
            outstanding_balance: balance,
            current_rate: current,
            new_rate: new,
            remaining_term_years: term,
            deal_years: deal,
            arrangement_fee: 0.0,
            valuation_fee: 0.0,
            legal_fees: 0.0,
            early_repayment_charge: 0.0,
        }
    }

    #[test]
    fn lower_rate_with_no_fees_is_always_worth_switching() {
        let result = compare_remortgage(&query(200_000.0, 5.5, 4.0, 20, 5)).expect("valid query");
        assert!(result.monthly_savings > 0.0);
        assert!(result.total_savings_over_deal > 0.0);
        assert!(result.worth_switching);
        assert_eq!(result.break_even_months, None);
        assert!((result.annual_savings - result.monthly_savings * 12.0).abs() < 0.01);
    }

    #[test]
    fn fees_push_break_even_out_and_can_flip_the_verdict() {
        let mut q = query(200_000.0, 5.0, 4.8, 20, 2);
        q.arrangement_fee = 999.0;
        q.valuation_fee = 300.0;
        q.legal_fees = 500.0;
        let result = compare_remortgage(&q).expect("valid query");
        assert_eq!(result.total_fees, 1799.0);

        let break_even = result.break_even_months.expect("fees and savings present");
        // ceil(fees / monthly_savings) months to recoup.
        assert_eq!(break_even, (1799.0 / result.monthly_savings).ceil() as u32);
        // A 0.2 point cut on 200k saves roughly 23 a month; two years of that
        // never covers 1,799 in fees.
        assert!(!result.worth_switching);
        assert!(result.total_savings_over_deal < 0.0);
    }

    #[test]
    fn higher_new_rate_is_never_worth_switching() {
        let mut q = query(150_000.0, 4.0, 5.0, 15, 3);
        q.arrangement_fee = 500.0;
        let result = compare_remortgage(&q).expect("valid query");
        assert!(result.monthly_savings < 0.0);
        assert!(!result.worth_switching);
        // Negative savings never break even.
        assert_eq!(result.break_even_months, None);
    }

    #[test]
    fn identical_rates_save_nothing() {
        let result = compare_remortgage(&query(180_000.0, 4.5, 4.5, 18, 2)).expect("valid query");
        assert_eq!(result.monthly_savings, 0.0);
        assert_eq!(result.total_savings_over_deal, 0.0);
        assert!(!result.worth_switching);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(compare_remortgage(&query(0.0, 5.0, 4.0, 20, 5)).is_err());
        assert!(compare_remortgage(&query(200_000.0, -1.0, 4.0, 20, 5)).is_err());
        assert!(compare_remortgage(&query(200_000.0, 5.0, -0.5, 20, 5)).is_err());
        assert!(compare_remortgage(&query(200_000.0, 5.0, 4.0, 0, 5)).is_err());
        assert!(compare_remortgage(&query(200_000.0, 5.0, 4.0, 20, 0)).is_err());
        // Term and deal-period ceilings both hold.
        assert!(compare_remortgage(&query(200_000.0, 5.0, 4.0, 400_000_000, 5)).is_err());
        assert!(compare_remortgage(&query(200_000.0, 5.0, 4.0, 20, 400_000_000)).is_err());

        let mut q = query(200_000.0, 5.0, 4.0, 20, 5);
        q.legal_fees = -10.0;
        let error = compare_remortgage(&q).expect_err("must reject");
        assert_eq!(error.to_string(), "Fees cannot be negative");
    }
}
