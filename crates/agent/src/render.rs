use serde_json::Value;

use hearth_core::format_gbp;

/// Renders a tool result into reply text for the scripted provider. With an
/// LLM configured the model writes the prose instead; this renderer keeps the
/// no-network path conversational and fully deterministic.
pub fn render_reply(tool: &str, result: &Value) -> String {
    if let Some(error) = result.get("error").and_then(Value::as_str) {
        return error.to_string();
    }

    match tool {
        "calculate_mortgage" => render_mortgage(result),
        "calculate_stamp_duty" => render_stamp_duty(result),
        "compare_mortgages" => render_comparison(result),
        "calculate_affordability" => render_affordability(result),
        "simulate_overpayment" => render_overpayment(result),
        "compare_remortgage" => render_remortgage(result),
        "analyze_buy_to_let" => render_buy_to_let(result),
        _ => result.to_string(),
    }
}

fn render_mortgage(result: &Value) -> String {
    format!(
        "A {} mortgage at {}% over {} years costs {} a month. \
         You would pay {} in interest, {} in total.",
        money_field(result, "principal"),
        rate_field(result, "interest_rate"),
        result["term_years"],
        money_field(result, "monthly_payment"),
        money_field(result, "total_interest"),
        money_field(result, "total_paid"),
    )
}

fn render_stamp_duty(result: &Value) -> String {
    let mut reply = format!(
        "Stamp duty on a {} purchase is {} (an effective rate of {}%).",
        money_field(result, "property_value"),
        money_field(result, "stamp_duty"),
        rate_field(result, "effective_rate"),
    );

    let surcharge = result["surcharge"].as_f64().unwrap_or(0.0);
    if surcharge > 0.0 {
        reply.push_str(&format!(
            " That includes a {} additional-property surcharge.",
            money(surcharge)
        ));
    }

    if let Some(breakdown) = result["breakdown"].as_array() {
        for entry in breakdown {
            if let (Some(band), Some(rate), Some(tax)) = (
                entry["band"].as_str(),
                entry["rate"].as_str(),
                entry["tax"].as_f64(),
            ) {
                reply.push_str(&format!(" {band} at {rate}: {}.", money(tax)));
            }
        }
    }

    reply
}

fn render_comparison(result: &Value) -> String {
    let mut reply = String::new();

    if let Some(scenarios) = result["scenarios"].as_array() {
        for scenario in scenarios {
            reply.push_str(&format!(
                "Scenario {}: {} at {}% over {} years is {} a month ({} total interest).",
                scenario["scenario"],
                money_field(scenario, "principal"),
                rate_field(scenario, "annual_rate"),
                scenario["term_years"],
                money_field(scenario, "monthly_payment"),
                money_field(scenario, "total_interest"),
            ));
            reply.push(' ');
        }
    }

    reply.push_str(&format!(
        "Scenario {} is cheapest per month and scenario {} costs the least in interest overall.",
        result["cheapest_monthly"]["scenario"], result["lowest_total_interest"]["scenario"],
    ));
    reply
}

fn render_affordability(result: &Value) -> String {
    let mut reply = format!(
        "On an income of {} you could borrow roughly {} (standard multiple) \
         up to {} (maximum multiple).",
        money_field(result, "annual_income"),
        money_field(result, "standard_mortgage"),
        money_field(result, "max_mortgage"),
    );

    let deposit = result["deposit"].as_f64().unwrap_or(0.0);
    if deposit > 0.0 {
        reply.push_str(&format!(
            " With your {} deposit that supports a property price of {} to {}.",
            money(deposit),
            money_field(result, "standard_property_price"),
            money_field(result, "max_property_price"),
        ));
    }

    if let Some(note) = result["note"].as_str() {
        reply.push(' ');
        reply.push_str(note);
    }
    reply
}

fn render_overpayment(result: &Value) -> String {
    let months_saved = result["months_saved"].as_u64().unwrap_or(0);
    if months_saved == 0 {
        return format!(
            "Without overpaying, the payment is {} a month and you would pay {} in interest.",
            money_field(result, "base_monthly_payment"),
            money_field(result, "total_interest"),
        );
    }

    format!(
        "Overpaying {} a month on top of the {} payment clears the mortgage {} early \
         and saves {} in interest.",
        money_field(result, "monthly_overpayment"),
        money_field(result, "base_monthly_payment"),
        duration(months_saved),
        money_field(result, "interest_saved"),
    )
}

fn render_remortgage(result: &Value) -> String {
    let monthly_savings = result["monthly_savings"].as_f64().unwrap_or(0.0);
    if monthly_savings <= 0.0 {
        return format!(
            "Switching would not reduce your payments: {} now against {} on the new rate.",
            money_field(result, "current_monthly_payment"),
            money_field(result, "new_monthly_payment"),
        );
    }

    let mut reply = format!(
        "Switching cuts your payment from {} to {}, saving {} a month.",
        money_field(result, "current_monthly_payment"),
        money_field(result, "new_monthly_payment"),
        money(monthly_savings),
    );

    if let Some(break_even) = result["break_even_months"].as_u64() {
        reply.push_str(&format!(" You would recoup the fees after {}.", duration(break_even)));
    }

    let worth_it = result["worth_switching"].as_bool().unwrap_or(false);
    let net = result["total_savings_over_deal"].as_f64().unwrap_or(0.0);
    if worth_it {
        reply.push_str(&format!(" Over the deal you come out {} ahead after fees.", money(net)));
    } else {
        reply.push_str(&format!(
            " Over the deal you would be {} worse off after fees, so it is not worth switching.",
            money(-net)
        ));
    }
    reply
}

fn render_buy_to_let(result: &Value) -> String {
    let basis = if result["interest_only"].as_bool().unwrap_or(true) {
        "interest only"
    } else {
        "on repayment"
    };
    let mut reply = format!(
        "A {} loan on a {} property at {}% costs {} a month {basis}. \
         Rent of {} is a {}% gross annual yield, leaving {} a month after the mortgage.",
        money_field(result, "loan_amount"),
        money_field(result, "property_value"),
        rate_field(result, "annual_rate"),
        money_field(result, "monthly_payment"),
        money_field(result, "monthly_rent"),
        rate_field(result, "annual_rental_yield"),
        money_field(result, "monthly_cashflow"),
    );

    if let (Some(rent), Some(minimum)) =
        (result["monthly_rent"].as_f64(), result["minimum_rent_required"].as_f64())
    {
        let verdict = if rent >= minimum { "passes" } else { "falls short of" };
        reply.push_str(&format!(
            " The rent covers {}% of the payment and {verdict} the typical lender stress \
             test, which needs about {} a month.",
            rate_field(result, "interest_coverage_ratio"),
            money(minimum),
        ));
    }

    reply.push_str(&format!(
        " Expect around {} up front: the deposit plus {} stamp duty and typical fees.",
        money_field(result, "total_initial_costs"),
        money_field(result, "stamp_duty"),
    ));
    reply
}

fn money_field(value: &Value, field: &str) -> String {
    value[field].as_f64().map(money).unwrap_or_else(|| "unknown".to_string())
}

/// Pounds with separators, pence only when present: `£1,667.50` but `£2,500`.
fn money(value: f64) -> String {
    let pence = ((value.abs() * 100.0).round() as u64) % 100;
    if pence == 0 {
        format_gbp(value)
    } else {
        format!("{}.{pence:02}", format_gbp(value.trunc()))
    }
}

fn rate_field(value: &Value, field: &str) -> String {
    match value[field].as_f64() {
        Some(rate) => {
            if rate == rate.trunc() {
                format!("{rate:.0}")
            } else {
                format!("{rate}")
            }
        }
        None => "unknown".to_string(),
    }
}

fn duration(months: u64) -> String {
    let years = months / 12;
    let remainder = months % 12;
    match (years, remainder) {
        (0, m) => format!("{m} month{}", plural(m)),
        (y, 0) => format!("{y} year{}", plural(y)),
        (y, m) => format!("{y} year{} and {m} month{}", plural(y), plural(m)),
    }
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{duration, money, render_reply};

    #[test]
    fn errors_pass_through_verbatim() {
        let reply = render_reply("calculate_mortgage", &json!({"error": "Principal must be positive"}));
        assert_eq!(reply, "Principal must be positive");
    }

    #[test]
    fn mortgage_reply_includes_the_key_figures() {
        let result = json!({
            "monthly_payment": 1667.5,
            "total_interest": 200250.0,
            "total_paid": 500250.0,
            "principal": 300000.0,
            "interest_rate": 4.5,
            "term_years": 25
        });
        let reply = render_reply("calculate_mortgage", &result);
        assert!(reply.contains("£300,000"));
        assert!(reply.contains("4.5%"));
        assert!(reply.contains("25 years"));
        assert!(reply.contains("£1,667.50 a month"));
    }

    #[test]
    fn stamp_duty_reply_mentions_the_surcharge_when_present() {
        let result = json!({
            "stamp_duty": 11500.0,
            "effective_rate": 3.83,
            "property_value": 300000.0,
            "is_first_time_buyer": false,
            "is_additional_property": true,
            "surcharge": 9000.0,
            "breakdown": [
                {"band": "£250,000 - £925,000", "rate": "5%", "tax": 2500.0}
            ]
        });
        let reply = render_reply("calculate_stamp_duty", &result);
        assert!(reply.contains("£11,500"));
        assert!(reply.contains("surcharge"));
        assert!(reply.contains("£250,000 - £925,000 at 5%: £2,500."));
    }

    #[test]
    fn overpayment_reply_spells_out_the_time_saved() {
        let result = json!({
            "base_monthly_payment": 1389.58,
            "months_to_repay": 262,
            "total_interest": 130000.0,
            "interest_saved": 36000.0,
            "months_saved": 38,
            "monthly_overpayment": 200.0,
        });
        let reply = render_reply("simulate_overpayment", &result);
        assert!(reply.contains("3 years and 2 months early"));
        assert!(reply.contains("£36,000 in interest"));
    }

    #[test]
    fn remortgage_reply_gives_a_clear_verdict() {
        let positive = json!({
            "current_monthly_payment": 1375.77,
            "new_monthly_payment": 1212.0,
            "monthly_savings": 163.77,
            "annual_savings": 1965.24,
            "total_fees": 999.0,
            "total_savings_over_deal": 8827.2,
            "break_even_months": 7,
            "worth_switching": true
        });
        let reply = render_reply("compare_remortgage", &positive);
        assert!(reply.contains("saving £163.77 a month"));
        assert!(reply.contains("after 7 months"));
        assert!(reply.contains("ahead after fees"));
    }

    #[test]
    fn buy_to_let_reply_covers_yield_stress_test_and_costs() {
        let result = json!({
            "loan_amount": 187500.0,
            "ltv": 75.0,
            "monthly_payment": 859.38,
            "monthly_rental_yield": 0.48,
            "annual_rental_yield": 5.76,
            "interest_coverage_ratio": 140.0,
            "minimum_rent_required": 1246.0,
            "monthly_cashflow": 340.62,
            "stamp_duty": 7500.0,
            "total_initial_costs": 73000.0,
            "property_value": 250000.0,
            "deposit": 62500.0,
            "annual_rate": 5.5,
            "monthly_rent": 1200.0,
            "interest_only": true
        });
        let reply = render_reply("analyze_buy_to_let", &result);
        assert!(reply.contains("£859.38 a month interest only"));
        assert!(reply.contains("5.76% gross annual yield"));
        assert!(reply.contains("covers 140% of the payment"));
        assert!(reply.contains("falls short of"));
        assert!(reply.contains("£1,246 a month"));
        assert!(reply.contains("£73,000 up front"));
        assert!(reply.contains("£7,500 stamp duty"));
    }

    #[test]
    fn money_shows_pence_only_when_present() {
        assert_eq!(money(2500.0), "£2,500");
        assert_eq!(money(1667.5), "£1,667.50");
        assert_eq!(money(0.83), "£0.83");
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(duration(1), "1 month");
        assert_eq!(duration(12), "1 year");
        assert_eq!(duration(38), "3 years and 2 months");
    }
}
