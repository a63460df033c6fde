use serde_json::{json, Value};

use hearth_core::CalculatorState;

/// What the user appears to be asking about. One message maps to at most
/// one calculator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topic {
    Mortgage,
    StampDuty,
    Compare,
    Affordability,
    Overpayment,
    Remortgage,
    BuyToLet,
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedIntent {
    pub topic: Topic,
    /// Pound amounts in order of appearance, "£300k" style suffixes expanded.
    pub amounts: Vec<f64>,
    /// Percentages in order of appearance.
    pub percentages: Vec<f64>,
    pub term_years: Option<u32>,
    pub first_time_buyer: bool,
    pub additional_property: bool,
    pub confidence_score: u8,
    pub clarification_prompt: Option<String>,
}

/// A concrete tool invocation derived from free text plus session defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocation {
    pub tool: &'static str,
    pub arguments: Value,
}

#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> ExtractedIntent {
        let normalized_text = normalize_text(text);
        let tokens = tokenize(&normalized_text);

        let topic = detect_topic(&normalized_text);
        let amounts = extract_amounts(&tokens);
        let percentages = extract_percentages(&tokens, &normalized_text);
        let term_years = extract_term_years(&tokens);
        let first_time_buyer = normalized_text.contains("first time buyer")
            || normalized_text.contains("first-time buyer")
            || normalized_text.contains("ftb");
        let additional_property = normalized_text.contains("second home")
            || normalized_text.contains("additional property")
            || normalized_text.contains("buy to let")
            || normalized_text.contains("buy-to-let");

        let confidence_score = confidence_score(
            topic != Topic::Unknown,
            !amounts.is_empty(),
            !percentages.is_empty(),
            term_years.is_some(),
            first_time_buyer || additional_property,
        );

        let clarification_prompt = match topic {
            Topic::Unknown => Some(
                "I can help with mortgage payments, stamp duty, affordability, overpayments, \
                 remortgaging, buy-to-let sums, or comparing deals. Which would you like?"
                    .to_string(),
            ),
            Topic::StampDuty if amounts.is_empty() => {
                Some("What is the property purchase price?".to_string())
            }
            Topic::Affordability if amounts.is_empty() => {
                Some("What is your gross annual income?".to_string())
            }
            Topic::Compare if percentages.len() < 2 => {
                Some("Please give me at least two rates or deals to compare.".to_string())
            }
            Topic::Remortgage if percentages.len() < 2 => Some(
                "To compare a remortgage I need your current rate and the new rate.".to_string(),
            ),
            Topic::BuyToLet
                if !amounts.iter().any(|amount| *amount >= MONTHLY_AMOUNT_CEILING) =>
            {
                Some("What is the property purchase price?".to_string())
            }
            Topic::BuyToLet
                if !amounts.iter().any(|amount| *amount < MONTHLY_AMOUNT_CEILING) =>
            {
                Some("What monthly rent do you expect?".to_string())
            }
            _ => None,
        };

        ExtractedIntent {
            topic,
            amounts,
            percentages,
            term_years,
            first_time_buyer,
            additional_property,
            confidence_score,
            clarification_prompt,
        }
    }
}

impl ExtractedIntent {
    /// Fills in whatever the message left unsaid from the session state, the
    /// same way a returning caller would expect "and at 3.9%?" to reuse the
    /// loan they just described.
    pub fn to_invocation(&self, state: &CalculatorState) -> Option<ToolInvocation> {
        if self.clarification_prompt.is_some() {
            return None;
        }

        match self.topic {
            Topic::Mortgage => {
                let principal = self.largest_amount().unwrap_or(state.principal);
                let annual_rate = self.percentages.first().copied().unwrap_or(state.interest_rate);
                let term_years = self.term_years.unwrap_or(state.term_years);
                Some(ToolInvocation {
                    tool: "calculate_mortgage",
                    arguments: json!({
                        "principal": principal,
                        "annual_rate": annual_rate,
                        "term_years": term_years,
                    }),
                })
            }
            Topic::StampDuty => Some(ToolInvocation {
                tool: "calculate_stamp_duty",
                arguments: json!({
                    "property_value": self.largest_amount()?,
                    "is_first_time_buyer": self.first_time_buyer,
                    "is_additional_property": self.additional_property,
                }),
            }),
            Topic::Compare => {
                let principal = self.largest_amount().unwrap_or(state.principal);
                let term_years = self.term_years.unwrap_or(state.term_years);
                let scenarios: Vec<Value> = self
                    .percentages
                    .iter()
                    .map(|rate| {
                        json!({
                            "principal": principal,
                            "annual_rate": rate,
                            "term_years": term_years,
                        })
                    })
                    .collect();
                Some(ToolInvocation {
                    tool: "compare_mortgages",
                    arguments: json!({ "scenarios": scenarios }),
                })
            }
            Topic::Affordability => {
                // Track the income by position, not value: an income and a
                // deposit of the same size are still two amounts.
                let (income_index, annual_income) = self.largest_amount_indexed()?;
                let deposit = self
                    .amounts
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != income_index)
                    .map(|(_, amount)| *amount)
                    .fold(0.0, f64::max);
                Some(ToolInvocation {
                    tool: "calculate_affordability",
                    arguments: json!({
                        "annual_income": annual_income,
                        "monthly_outgoings": 0.0,
                        "deposit": deposit,
                    }),
                })
            }
            Topic::Overpayment => {
                // Small amounts read as the monthly extra, large ones as the
                // outstanding balance.
                let overpayment = self
                    .amounts
                    .iter()
                    .copied()
                    .filter(|amount| *amount < MONTHLY_AMOUNT_CEILING)
                    .fold(0.0, f64::max);
                let principal = self
                    .amounts
                    .iter()
                    .copied()
                    .filter(|amount| *amount >= MONTHLY_AMOUNT_CEILING)
                    .fold(0.0, f64::max);
                let principal = if principal > 0.0 { principal } else { state.principal };
                Some(ToolInvocation {
                    tool: "simulate_overpayment",
                    arguments: json!({
                        "principal": principal,
                        "annual_rate": self.percentages.first().copied()
                            .unwrap_or(state.interest_rate),
                        "term_years": self.term_years.unwrap_or(state.term_years),
                        "monthly_overpayment": overpayment,
                    }),
                })
            }
            Topic::BuyToLet => {
                let property_value = self
                    .amounts
                    .iter()
                    .copied()
                    .filter(|amount| *amount >= MONTHLY_AMOUNT_CEILING)
                    .fold(0.0, f64::max);
                let monthly_rent = self
                    .amounts
                    .iter()
                    .copied()
                    .filter(|amount| *amount < MONTHLY_AMOUNT_CEILING)
                    .fold(0.0, f64::max);
                if property_value <= 0.0 || monthly_rent <= 0.0 {
                    return None;
                }
                // A second large amount reads as the deposit.
                let deposit = self
                    .amounts
                    .iter()
                    .copied()
                    .filter(|amount| (MONTHLY_AMOUNT_CEILING..property_value).contains(amount))
                    .fold(0.0, f64::max);
                let deposit = if deposit > 0.0 {
                    deposit
                } else {
                    property_value * DEFAULT_DEPOSIT_FRACTION
                };
                Some(ToolInvocation {
                    tool: "analyze_buy_to_let",
                    arguments: json!({
                        "property_value": property_value,
                        "deposit": deposit,
                        "annual_rate": self.percentages.first().copied()
                            .unwrap_or(state.interest_rate),
                        "monthly_rent": monthly_rent,
                    }),
                })
            }
            Topic::Remortgage => Some(ToolInvocation {
                tool: "compare_remortgage",
                arguments: json!({
                    "outstanding_balance": self.largest_amount().unwrap_or(state.principal),
                    "current_rate": self.percentages.first().copied()?,
                    "new_rate": self.percentages.get(1).copied()?,
                    "remaining_term_years": self.term_years.unwrap_or(state.term_years),
                    "deal_years": DEFAULT_DEAL_YEARS,
                }),
            }),
            Topic::Unknown => None,
        }
    }

    fn largest_amount(&self) -> Option<f64> {
        self.largest_amount_indexed().map(|(_, amount)| amount)
    }

    /// First maximum wins on ties, so the earlier mention reads as the
    /// headline figure.
    fn largest_amount_indexed(&self) -> Option<(usize, f64)> {
        self.amounts.iter().copied().enumerate().fold(None, |best, (index, amount)| match best {
            Some((_, current)) if current >= amount => best,
            _ => Some((index, amount)),
        })
    }
}

/// Amounts below this are read as monthly figures (overpayments, rent).
const MONTHLY_AMOUNT_CEILING: f64 = 5_000.0;

/// Assumed buy-to-let deposit when the message names only the price.
const DEFAULT_DEPOSIT_FRACTION: f64 = 0.25;

/// Fixed-deal length assumed when the message does not name one.
const DEFAULT_DEAL_YEARS: u32 = 5;

fn normalize_text(text: &str) -> String {
    text.to_ascii_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || matches!(character, '£' | '%' | '.' | ',') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}

fn detect_topic(normalized_text: &str) -> Topic {
    if normalized_text.contains("stamp duty") || normalized_text.contains("sdlt") {
        return Topic::StampDuty;
    }
    // Stamp duty wins above, so "buy-to-let stamp duty" keeps the surcharge
    // path rather than the landlord calculator.
    if normalized_text.contains("buy to let")
        || normalized_text.contains("buy-to-let")
        || normalized_text.contains("rental yield")
        || normalized_text.contains("landlord")
    {
        return Topic::BuyToLet;
    }
    // "remortgag" covers remortgage, remortgaging, remortgaged.
    if normalized_text.contains("remortgag") || normalized_text.contains("switch") {
        return Topic::Remortgage;
    }
    if normalized_text.contains("overpay") || normalized_text.contains("extra each month") {
        return Topic::Overpayment;
    }
    if normalized_text.contains("compare")
        || normalized_text.contains(" versus ")
        || normalized_text.contains(" vs ")
    {
        return Topic::Compare;
    }
    if normalized_text.contains("afford")
        || normalized_text.contains("borrow")
        || normalized_text.contains("income")
        || normalized_text.contains("earn")
    {
        return Topic::Affordability;
    }
    if normalized_text.contains("mortgage")
        || normalized_text.contains("monthly payment")
        || normalized_text.contains("repayment")
    {
        return Topic::Mortgage;
    }
    Topic::Unknown
}

fn extract_amounts(tokens: &[String]) -> Vec<f64> {
    let mut amounts = Vec::new();
    for token in tokens {
        if token.ends_with('%') {
            continue;
        }
        if let Some(amount) = parse_money_token(token) {
            amounts.push(amount);
        }
    }
    amounts
}

fn parse_money_token(token: &str) -> Option<f64> {
    let has_pound = token.starts_with('£');
    let trimmed = token.trim_start_matches('£').replace(',', "");
    if trimmed.is_empty() {
        return None;
    }

    let (number_part, multiplier) = if let Some(prefix) = trimmed.strip_suffix('k') {
        (prefix, 1_000.0)
    } else if let Some(prefix) = trimmed.strip_suffix('m') {
        (prefix, 1_000_000.0)
    } else {
        (trimmed.as_str(), 1.0)
    };

    let amount = number_part.parse::<f64>().ok()? * multiplier;
    // A bare "25" is far more likely a term or a rate than £25.
    if !has_pound && multiplier == 1.0 && amount < 1_000.0 {
        return None;
    }
    (amount > 0.0).then_some(amount)
}

fn extract_percentages(tokens: &[String], normalized_text: &str) -> Vec<f64> {
    let mut percentages = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        if let Some(raw) = token.strip_suffix('%') {
            if let Ok(percent) = raw.parse::<f64>() {
                percentages.push(percent);
                continue;
            }
        }
        let next_is_percent = tokens
            .get(index + 1)
            .map(|next| next == "percent" || next == "per" || next == "%")
            .unwrap_or(false);
        if next_is_percent {
            if let Ok(percent) = token.parse::<f64>() {
                percentages.push(percent);
            }
        }
    }

    // "at 4.5 over 25 years" phrasing carries no unit at all.
    if percentages.is_empty() && normalized_text.contains(" at ") {
        for (index, token) in tokens.iter().enumerate() {
            if token == "at" {
                if let Some(candidate) = tokens.get(index + 1) {
                    if let Ok(value) = candidate.parse::<f64>() {
                        if value < 20.0 {
                            percentages.push(value);
                        }
                    }
                }
            }
        }
    }

    percentages
}

fn extract_term_years(tokens: &[String]) -> Option<u32> {
    for (index, token) in tokens.iter().enumerate() {
        let is_year_unit = matches!(token.as_str(), "year" | "years" | "yr" | "yrs");
        if !is_year_unit || index == 0 {
            continue;
        }
        if let Ok(years) = tokens[index - 1].parse::<u32>() {
            if (1..=40).contains(&years) {
                return Some(years);
            }
        }
    }
    None
}

fn confidence_score(
    has_topic: bool,
    has_amount: bool,
    has_rate: bool,
    has_term: bool,
    has_flags: bool,
) -> u8 {
    let mut score = 10u8;
    if has_topic {
        score += 40;
    }
    if has_amount {
        score += 25;
    }
    if has_rate {
        score += 10;
    }
    if has_term {
        score += 10;
    }
    if has_flags {
        score += 5;
    }
    score.min(100)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use hearth_core::CalculatorState;

    use super::{IntentExtractor, Topic};

    #[test]
    fn extracts_a_full_mortgage_request() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("What's the mortgage on £300k at 4.5% over 25 years?");

        assert_eq!(intent.topic, Topic::Mortgage);
        assert_eq!(intent.amounts, vec![300_000.0]);
        assert_eq!(intent.percentages, vec![4.5]);
        assert_eq!(intent.term_years, Some(25));
        assert!(intent.confidence_score >= 80);

        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("complete request");
        assert_eq!(invocation.tool, "calculate_mortgage");
        assert_eq!(invocation.arguments["principal"], json!(300000.0));
        assert_eq!(invocation.arguments["term_years"], json!(25));
    }

    #[test]
    fn stamp_duty_request_picks_up_buyer_flags() {
        let extractor = IntentExtractor::new();
        let intent =
            extractor.extract("How much stamp duty on a £400,000 home as a first time buyer?");

        assert_eq!(intent.topic, Topic::StampDuty);
        assert!(intent.first_time_buyer);
        assert!(!intent.additional_property);

        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("complete request");
        assert_eq!(invocation.tool, "calculate_stamp_duty");
        assert_eq!(invocation.arguments["property_value"], json!(400000.0));
        assert_eq!(invocation.arguments["is_first_time_buyer"], json!(true));
    }

    #[test]
    fn second_home_phrasing_sets_the_surcharge_flag() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Stamp duty on a £300k second home please");
        assert!(intent.additional_property);
    }

    #[test]
    fn partial_requests_fall_back_to_session_state() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("And what would the mortgage repayment be at 3.9%?");

        let mut state = CalculatorState::default();
        state.principal = 250_000.0;
        state.term_years = 30;

        let invocation = intent.to_invocation(&state).expect("state fills the gaps");
        assert_eq!(invocation.tool, "calculate_mortgage");
        assert_eq!(invocation.arguments["principal"], json!(250000.0));
        assert_eq!(invocation.arguments["annual_rate"], json!(3.9));
        assert_eq!(invocation.arguments["term_years"], json!(30));
    }

    #[test]
    fn comparison_needs_two_rates() {
        let extractor = IntentExtractor::new();
        let vague = extractor.extract("Can you compare deals for me?");
        assert!(vague.clarification_prompt.is_some());
        assert_eq!(vague.to_invocation(&CalculatorState::default()), None);

        let complete = extractor.extract("Compare £300k at 4.5% vs 3.9% over 25 years");
        let invocation =
            complete.to_invocation(&CalculatorState::default()).expect("two rates present");
        assert_eq!(invocation.tool, "compare_mortgages");
        let scenarios = invocation.arguments["scenarios"].as_array().expect("scenarios");
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[1]["annual_rate"], json!(3.9));
    }

    #[test]
    fn affordability_reads_income_and_deposit() {
        let extractor = IntentExtractor::new();
        let intent =
            extractor.extract("How much could I borrow? I earn £55,000 with a £30k deposit");

        assert_eq!(intent.topic, Topic::Affordability);
        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("income present");
        assert_eq!(invocation.tool, "calculate_affordability");
        assert_eq!(invocation.arguments["annual_income"], json!(55000.0));
        assert_eq!(invocation.arguments["deposit"], json!(30000.0));
    }

    #[test]
    fn deposit_matching_the_income_is_not_lost() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("I earn £50k with a £50k deposit, what can I borrow?");

        assert_eq!(intent.topic, Topic::Affordability);
        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("income present");
        assert_eq!(invocation.arguments["annual_income"], json!(50000.0));
        assert_eq!(invocation.arguments["deposit"], json!(50000.0));
    }

    #[test]
    fn buy_to_let_reads_price_deposit_and_rent() {
        let extractor = IntentExtractor::new();
        let intent = extractor
            .extract("Buy to let: £250k with a £60k deposit at 5.5%, rent £1,200 a month");

        assert_eq!(intent.topic, Topic::BuyToLet);
        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("price and rent present");
        assert_eq!(invocation.tool, "analyze_buy_to_let");
        assert_eq!(invocation.arguments["property_value"], json!(250000.0));
        assert_eq!(invocation.arguments["deposit"], json!(60000.0));
        assert_eq!(invocation.arguments["annual_rate"], json!(5.5));
        assert_eq!(invocation.arguments["monthly_rent"], json!(1200.0));
    }

    #[test]
    fn buy_to_let_without_a_deposit_assumes_a_quarter() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("What would a £200k buy-to-let renting at £950 look like?");

        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("price and rent present");
        assert_eq!(invocation.arguments["deposit"], json!(50000.0));
    }

    #[test]
    fn buy_to_let_asks_for_whichever_figure_is_missing() {
        let extractor = IntentExtractor::new();

        let no_price = extractor.extract("What rental yield does my buy-to-let make on £1,100?");
        assert_eq!(no_price.topic, Topic::BuyToLet);
        assert_eq!(
            no_price.clarification_prompt.as_deref(),
            Some("What is the property purchase price?")
        );
        assert_eq!(no_price.to_invocation(&CalculatorState::default()), None);

        let no_rent = extractor.extract("Thinking about a £250k buy to let");
        assert_eq!(
            no_rent.clarification_prompt.as_deref(),
            Some("What monthly rent do you expect?")
        );
    }

    #[test]
    fn overpayment_splits_balance_from_monthly_extra() {
        let extractor = IntentExtractor::new();
        let intent =
            extractor.extract("What if I overpay £200 a month on my £250k mortgage over 25 years?");

        assert_eq!(intent.topic, Topic::Overpayment);
        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("complete request");
        assert_eq!(invocation.tool, "simulate_overpayment");
        assert_eq!(invocation.arguments["principal"], json!(250000.0));
        assert_eq!(invocation.arguments["monthly_overpayment"], json!(200.0));
    }

    #[test]
    fn remortgage_takes_current_then_new_rate() {
        let extractor = IntentExtractor::new();
        let intent = extractor
            .extract("Worth remortgaging £200k from 5.5% to 4% with 20 years left?");

        assert_eq!(intent.topic, Topic::Remortgage);
        let invocation =
            intent.to_invocation(&CalculatorState::default()).expect("both rates present");
        assert_eq!(invocation.tool, "compare_remortgage");
        assert_eq!(invocation.arguments["current_rate"], json!(5.5));
        assert_eq!(invocation.arguments["new_rate"], json!(4.0));
        assert_eq!(invocation.arguments["remaining_term_years"], json!(20));
    }

    #[test]
    fn ambiguous_text_requests_clarification() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Can you help?");
        assert_eq!(intent.topic, Topic::Unknown);
        assert!(intent.clarification_prompt.is_some());
        assert_eq!(intent.to_invocation(&CalculatorState::default()), None);
    }

    #[test]
    fn handles_common_phrasings() {
        struct Case {
            text: &'static str,
            topic: Topic,
            expect_amount: bool,
        }

        let cases = vec![
            Case { text: "mortgage on 300k", topic: Topic::Mortgage, expect_amount: true },
            Case {
                text: "monthly payment for £150,000 at 3.99% over 30 years",
                topic: Topic::Mortgage,
                expect_amount: true,
            },
            Case {
                text: "stamp duty for a 1.2m house",
                topic: Topic::StampDuty,
                expect_amount: true,
            },
            Case {
                text: "sdlt on £625,000 as a first-time buyer",
                topic: Topic::StampDuty,
                expect_amount: true,
            },
            Case {
                text: "what can I afford on £48k a year",
                topic: Topic::Affordability,
                expect_amount: true,
            },
            Case {
                text: "how much can we borrow",
                topic: Topic::Affordability,
                expect_amount: false,
            },
            Case {
                text: "overpaying by £300 a month",
                topic: Topic::Overpayment,
                expect_amount: true,
            },
            Case {
                text: "compare 4.2% versus 4.8%",
                topic: Topic::Compare,
                expect_amount: false,
            },
            Case {
                text: "should I switch from 6% to 4.5%",
                topic: Topic::Remortgage,
                expect_amount: false,
            },
            Case {
                text: "buy-to-let stamp duty on £350k",
                topic: Topic::StampDuty,
                expect_amount: true,
            },
            Case {
                text: "rental yield on a £250k flat letting at £1,100",
                topic: Topic::BuyToLet,
                expect_amount: true,
            },
        ];

        let extractor = IntentExtractor::new();
        for (index, case) in cases.iter().enumerate() {
            let intent = extractor.extract(case.text);
            assert_eq!(intent.topic, case.topic, "case {index}: {}", case.text);
            if case.expect_amount {
                assert!(!intent.amounts.is_empty(), "case {index} expected amounts: {}", case.text);
            }
            assert!(intent.confidence_score > 10, "case {index}: {}", case.text);
        }
    }
}
