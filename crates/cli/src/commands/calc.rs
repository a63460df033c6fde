use clap::Subcommand;
use serde::Serialize;

use hearth_core::engine::comparison::{DEFAULT_ANNUAL_RATE, DEFAULT_PRINCIPAL, DEFAULT_TERM_YEARS};
use hearth_core::{
    analyze_buy_to_let, compare_remortgage, compare_scenarios, compute_repayment,
    compute_stamp_duty, estimate_affordability, simulate_overpayment, AffordabilityQuery,
    BuyToLetQuery, CalcError, LoanTerms, OverpaymentQuery, RemortgageQuery, ScenarioInput,
    StampDutyQuery,
};

use super::CommandResult;

/// Direct engine invocation. Every subcommand prints the same JSON payload
/// the HTTP tools return, so output can be piped straight into `jq`.
#[derive(Debug, Subcommand)]
pub enum CalcCommand {
    #[command(about = "Monthly payment and lifetime interest for a repayment mortgage")]
    Mortgage {
        #[arg(long, default_value_t = DEFAULT_PRINCIPAL, help = "Amount borrowed in pounds")]
        principal: f64,
        #[arg(long, default_value_t = DEFAULT_ANNUAL_RATE, help = "Annual interest rate in percent")]
        annual_rate: f64,
        #[arg(long, default_value_t = DEFAULT_TERM_YEARS, help = "Term in years")]
        term_years: u32,
    },
    #[command(about = "Stamp duty (SDLT) on a residential purchase in England or NI")]
    StampDuty {
        #[arg(long, help = "Purchase price in pounds")]
        property_value: f64,
        #[arg(long, help = "Apply first-time buyer relief")]
        first_time_buyer: bool,
        #[arg(long, help = "Apply the additional-property surcharge")]
        additional_property: bool,
    },
    #[command(about = "Compare two or more mortgage scenarios side by side")]
    Compare {
        #[arg(
            long = "scenario",
            value_name = "PRINCIPAL,RATE,TERM",
            help = "Repeatable. Leave a slot empty to use the default, e.g. 250000,,30"
        )]
        scenarios: Vec<String>,
    },
    #[command(about = "Estimate borrowing capacity from income, outgoings, and deposit")]
    Affordability {
        #[arg(long, help = "Gross annual income in pounds")]
        annual_income: f64,
        #[arg(long, default_value_t = 0.0, help = "Committed monthly outgoings in pounds")]
        monthly_outgoings: f64,
        #[arg(long, default_value_t = 0.0, help = "Deposit in pounds")]
        deposit: f64,
    },
    #[command(about = "Interest and term saved by a fixed monthly overpayment")]
    Overpayment {
        #[arg(long, default_value_t = DEFAULT_PRINCIPAL)]
        principal: f64,
        #[arg(long, default_value_t = DEFAULT_ANNUAL_RATE)]
        annual_rate: f64,
        #[arg(long, default_value_t = DEFAULT_TERM_YEARS)]
        term_years: u32,
        #[arg(long, help = "Extra payment each month in pounds")]
        monthly_overpayment: f64,
    },
    #[command(about = "Whether switching to a new rate beats staying, after fees")]
    Remortgage {
        #[arg(long, help = "Balance still owed in pounds")]
        outstanding_balance: f64,
        #[arg(long, help = "Current annual rate in percent")]
        current_rate: f64,
        #[arg(long, help = "Offered annual rate in percent")]
        new_rate: f64,
        #[arg(long, help = "Years left on the mortgage")]
        remaining_term_years: u32,
        #[arg(long, default_value_t = 5, help = "Length of the new deal in years")]
        deal_years: u32,
        #[arg(long, default_value_t = 0.0)]
        arrangement_fee: f64,
        #[arg(long, default_value_t = 0.0)]
        valuation_fee: f64,
        #[arg(long, default_value_t = 0.0)]
        legal_fees: f64,
        #[arg(long, default_value_t = 0.0)]
        early_repayment_charge: f64,
    },
    #[command(about = "Yield, cashflow, stress test, and purchase costs for a rental property")]
    BuyToLet {
        #[arg(long, help = "Purchase price in pounds")]
        property_value: f64,
        #[arg(long, help = "Deposit in pounds; defaults to 25% of the price")]
        deposit: Option<f64>,
        #[arg(long, default_value_t = 5.5, help = "Annual interest rate in percent")]
        annual_rate: f64,
        #[arg(long, help = "Expected monthly rent in pounds")]
        monthly_rent: f64,
        #[arg(long, help = "Price on a repayment basis instead of interest-only")]
        repayment: bool,
        #[arg(long, default_value_t = DEFAULT_TERM_YEARS, help = "Term in years (repayment basis)")]
        term_years: u32,
    },
}

pub fn run(command: CalcCommand) -> CommandResult {
    match command {
        CalcCommand::Mortgage { principal, annual_rate, term_years } => emit(
            "calc.mortgage",
            compute_repayment(&LoanTerms {
                principal,
                annual_rate_percent: annual_rate,
                term_years,
            }),
        ),
        CalcCommand::StampDuty { property_value, first_time_buyer, additional_property } => emit(
            "calc.stamp-duty",
            compute_stamp_duty(&StampDutyQuery {
                property_value,
                is_first_time_buyer: first_time_buyer,
                is_additional_property: additional_property,
            }),
        ),
        CalcCommand::Compare { scenarios } => {
            let mut inputs = Vec::with_capacity(scenarios.len());
            for raw in &scenarios {
                match parse_scenario(raw) {
                    Ok(input) => inputs.push(input),
                    Err(message) => {
                        return CommandResult::failure("calc.compare", "invalid_input", message, 1);
                    }
                }
            }
            emit("calc.compare", compare_scenarios(&inputs))
        }
        CalcCommand::Affordability { annual_income, monthly_outgoings, deposit } => emit(
            "calc.affordability",
            estimate_affordability(&AffordabilityQuery {
                annual_income,
                monthly_outgoings,
                deposit,
            }),
        ),
        CalcCommand::Overpayment { principal, annual_rate, term_years, monthly_overpayment } => {
            emit(
                "calc.overpayment",
                simulate_overpayment(&OverpaymentQuery {
                    principal,
                    annual_rate_percent: annual_rate,
                    term_years,
                    monthly_overpayment,
                }),
            )
        }
        CalcCommand::Remortgage {
            outstanding_balance,
            current_rate,
            new_rate,
            remaining_term_years,
            deal_years,
            arrangement_fee,
            valuation_fee,
            legal_fees,
            early_repayment_charge,
        } => emit(
            "calc.remortgage",
            compare_remortgage(&RemortgageQuery {
                outstanding_balance,
                current_rate,
                new_rate,
                remaining_term_years,
                deal_years,
                arrangement_fee,
                valuation_fee,
                legal_fees,
                early_repayment_charge,
            }),
        ),
        CalcCommand::BuyToLet {
            property_value,
            deposit,
            annual_rate,
            monthly_rent,
            repayment,
            term_years,
        } => emit(
            "calc.buy-to-let",
            analyze_buy_to_let(&BuyToLetQuery {
                property_value,
                deposit: deposit.unwrap_or(property_value * 0.25),
                annual_rate_percent: annual_rate,
                monthly_rent,
                interest_only: !repayment,
                term_years,
            }),
        ),
    }
}

fn emit<T: Serialize>(command: &str, outcome: Result<T, CalcError>) -> CommandResult {
    match outcome {
        Ok(result) => {
            let output = serde_json::to_string_pretty(&result).unwrap_or_else(|error| {
                format!("{{\"error\":\"serialization failed: {error}\"}}")
            });
            CommandResult { exit_code: 0, output }
        }
        Err(error) => {
            CommandResult::failure(command, error_class(&error), error.to_string(), 1)
        }
    }
}

fn error_class(error: &CalcError) -> &'static str {
    match error {
        CalcError::InvalidInput { .. } => "invalid_input",
        CalcError::InsufficientScenarios { .. } => "insufficient_scenarios",
    }
}

/// `PRINCIPAL,RATE,TERM` with any slot left empty to take the default.
fn parse_scenario(raw: &str) -> Result<ScenarioInput, String> {
    let slots: Vec<&str> = raw.split(',').map(str::trim).collect();
    if slots.len() > 3 {
        return Err(format!("scenario `{raw}` has more than three slots"));
    }

    let number = |slot: &str| -> Result<Option<f64>, String> {
        if slot.is_empty() {
            return Ok(None);
        }
        slot.parse::<f64>()
            .map(Some)
            .map_err(|_| format!("scenario slot `{slot}` is not a number"))
    };

    let mut input = ScenarioInput::default();
    if let Some(slot) = slots.first() {
        input.principal = number(slot)?;
    }
    if let Some(slot) = slots.get(1) {
        input.annual_rate = number(slot)?;
    }
    if let Some(slot) = slots.get(2) {
        if !slot.is_empty() {
            let term = slot
                .parse::<u32>()
                .map_err(|_| format!("scenario slot `{slot}` is not a whole number of years"))?;
            input.term_years = Some(term);
        }
    }

    Ok(input)
}
