/// Rounds a currency amount to two decimal places using round-half-to-even
/// (banker's rounding). The amortization formula feeds arbitrary `f64`
/// values in, so exact ties are rare, but the tie-breaking rule must be
/// fixed for results to be reproducible across platforms.
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Formats a whole-pound amount with thousands separators: `1500000.0`
/// becomes `"£1,500,000"`. Fractional pennies are rounded away; band labels
/// and rendered replies only ever deal in whole pounds.
pub fn format_gbp(value: f64) -> String {
    let pounds = value.round_ties_even() as i64;
    let digits = pounds.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, digit) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if pounds < 0 {
        format!("-£{grouped}")
    } else {
        format!("£{grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_gbp, round_currency};

    #[test]
    fn rounds_to_two_decimal_places() {
        assert_eq!(round_currency(1234.5678), 1234.57);
        assert_eq!(round_currency(0.1049), 0.1);
        assert_eq!(round_currency(99.999), 100.0);
    }

    #[test]
    fn ties_round_to_even() {
        // 0.125 and 0.375 are exactly representable, so these are true ties.
        assert_eq!(round_currency(0.125), 0.12);
        assert_eq!(round_currency(0.375), 0.38);
        assert_eq!(round_currency(12.625), 12.62);
    }

    #[test]
    fn formats_pounds_with_separators() {
        assert_eq!(format_gbp(0.0), "£0");
        assert_eq!(format_gbp(999.0), "£999");
        assert_eq!(format_gbp(1_000.0), "£1,000");
        assert_eq!(format_gbp(250_000.0), "£250,000");
        assert_eq!(format_gbp(1_500_000.0), "£1,500,000");
        assert_eq!(format_gbp(-42_500.0), "-£42,500");
    }
}
