use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use hearth_core::{
    analyze_buy_to_let, compare_remortgage, compare_scenarios, compute_repayment,
    compute_stamp_duty, estimate_affordability, simulate_overpayment, AffordabilityQuery,
    BuyToLetQuery, CalculatorState, LoanTerms, OverpaymentQuery, RemortgageQuery, ScenarioInput,
    StampDutyQuery,
};

/// A calculator exposed to the conversation. Execution never fails at the
/// Rust level: validation problems come back as `{"error": "<message>"}`
/// values so the model (or the renderer) can relay them verbatim.
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema for the tool's arguments, in the chat-completions shape.
    fn parameters(&self) -> Value;
    fn execute(&self, state: &mut CalculatorState, input: Value) -> Value;
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// All seven calculators, in the order they are advertised to the model.
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(CalculateMortgage);
        registry.register(CalculateStampDuty);
        registry.register(CompareMortgages);
        registry.register(CalculateAffordability);
        registry.register(SimulateOverpayment);
        registry.register(CompareRemortgage);
        registry.register(AnalyzeBuyToLet);
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.push(Box::new(tool));
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|tool| tool.name() == name).map(Box::as_ref)
    }

    /// Runs the named tool, or reports the unknown name as a tool-level
    /// error value.
    pub fn dispatch(&self, name: &str, state: &mut CalculatorState, input: Value) -> Value {
        let Some(tool) = self.get(name) else {
            return error_value(format!("Unknown tool: {name}"));
        };
        debug!(event_name = "tool_dispatch", tool = name, "dispatching tool call");
        tool.execute(state, input)
    }

    /// Chat-completions tool specs for every registered tool.
    pub fn specs(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name(),
                        "description": tool.description(),
                        "parameters": tool.parameters(),
                    }
                })
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_default_tools()
    }
}

fn error_value(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

fn parse_input<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, Value> {
    serde_json::from_value(input).map_err(|err| error_value(format!("Invalid arguments: {err}")))
}

/// Serializes an engine result and appends input echo fields, preserving the
/// result's own field order first.
fn with_echo<T: serde::Serialize>(result: &T, echo: &[(&str, Value)]) -> Value {
    let mut object = match serde_json::to_value(result) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return other,
        Err(err) => return error_value(err.to_string()),
    };
    for (key, value) in echo {
        object.insert((*key).to_string(), value.clone());
    }
    Value::Object(object)
}

fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

#[derive(Deserialize)]
struct MortgageArgs {
    principal: f64,
    annual_rate: f64,
    term_years: u32,
}

pub struct CalculateMortgage;

impl Tool for CalculateMortgage {
    fn name(&self) -> &'static str {
        "calculate_mortgage"
    }

    fn description(&self) -> &'static str {
        "Calculate the monthly repayment and total cost of a mortgage."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "principal": {
                    "type": "number",
                    "description": "Loan amount in GBP, e.g. 300000 for £300,000"
                },
                "annual_rate": {
                    "type": "number",
                    "description": "Annual interest rate as a percentage, e.g. 4.5"
                },
                "term_years": {
                    "type": "integer",
                    "description": "Loan term in years, e.g. 25"
                }
            },
            "required": ["principal", "annual_rate", "term_years"]
        })
    }

    fn execute(&self, state: &mut CalculatorState, input: Value) -> Value {
        let args: MortgageArgs = match parse_input(input) {
            Ok(args) => args,
            Err(error) => return error,
        };
        let terms = LoanTerms {
            principal: args.principal,
            annual_rate_percent: args.annual_rate,
            term_years: args.term_years,
        };
        match compute_repayment(&terms) {
            Ok(result) => {
                state.principal = args.principal;
                state.interest_rate = args.annual_rate;
                state.term_years = args.term_years;
                state.monthly_payment = Some(result.monthly_payment);
                state.total_interest = Some(result.total_interest);
                with_echo(
                    &result,
                    &[
                        ("principal", number(args.principal)),
                        ("interest_rate", number(args.annual_rate)),
                        ("term_years", json!(args.term_years)),
                    ],
                )
            }
            Err(error) => error_value(error.to_string()),
        }
    }
}

pub struct CalculateStampDuty;

impl Tool for CalculateStampDuty {
    fn name(&self) -> &'static str {
        "calculate_stamp_duty"
    }

    fn description(&self) -> &'static str {
        "Calculate UK Stamp Duty Land Tax (SDLT) on a property purchase."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "property_value": {
                    "type": "number",
                    "description": "Property purchase price in GBP"
                },
                "is_first_time_buyer": {
                    "type": "boolean",
                    "description": "True if this is the buyer's first property"
                },
                "is_additional_property": {
                    "type": "boolean",
                    "description": "True if the buyer already owns a property"
                }
            },
            "required": ["property_value"]
        })
    }

    fn execute(&self, state: &mut CalculatorState, input: Value) -> Value {
        let query: StampDutyQuery = match parse_input(input) {
            Ok(query) => query,
            Err(error) => return error,
        };
        match compute_stamp_duty(&query) {
            Ok(result) => {
                state.property_value = Some(query.property_value);
                state.stamp_duty = Some(result.stamp_duty);
                with_echo(
                    &result,
                    &[
                        ("property_value", number(query.property_value)),
                        ("is_first_time_buyer", json!(query.is_first_time_buyer)),
                        ("is_additional_property", json!(query.is_additional_property)),
                    ],
                )
            }
            Err(error) => error_value(error.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct CompareArgs {
    scenarios: Vec<ScenarioInput>,
}

pub struct CompareMortgages;

impl Tool for CompareMortgages {
    fn name(&self) -> &'static str {
        "compare_mortgages"
    }

    fn description(&self) -> &'static str {
        "Compare two or more mortgage scenarios against the first one."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "scenarios": {
                    "type": "array",
                    "description": "At least two scenarios to compare",
                    "items": {
                        "type": "object",
                        "properties": {
                            "principal": { "type": "number" },
                            "annual_rate": { "type": "number" },
                            "term_years": { "type": "integer" }
                        }
                    }
                }
            },
            "required": ["scenarios"]
        })
    }

    fn execute(&self, _state: &mut CalculatorState, input: Value) -> Value {
        let args: CompareArgs = match parse_input(input) {
            Ok(args) => args,
            Err(error) => return error,
        };
        match compare_scenarios(&args.scenarios) {
            Ok(result) => serde_json::to_value(&result)
                .unwrap_or_else(|err| error_value(err.to_string())),
            Err(error) => error_value(error.to_string()),
        }
    }
}

pub struct CalculateAffordability;

impl Tool for CalculateAffordability {
    fn name(&self) -> &'static str {
        "calculate_affordability"
    }

    fn description(&self) -> &'static str {
        "Estimate how much a buyer could borrow based on income."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "annual_income": {
                    "type": "number",
                    "description": "Gross annual income in GBP"
                },
                "monthly_outgoings": {
                    "type": "number",
                    "description": "Regular monthly outgoings (debts, etc.)"
                },
                "deposit": {
                    "type": "number",
                    "description": "Available deposit amount"
                }
            },
            "required": ["annual_income"]
        })
    }

    fn execute(&self, _state: &mut CalculatorState, input: Value) -> Value {
        let query: AffordabilityQuery = match parse_input(input) {
            Ok(query) => query,
            Err(error) => return error,
        };
        match estimate_affordability(&query) {
            Ok(result) => serde_json::to_value(&result)
                .unwrap_or_else(|err| error_value(err.to_string())),
            Err(error) => error_value(error.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct OverpaymentArgs {
    principal: f64,
    annual_rate: f64,
    term_years: u32,
    #[serde(default)]
    monthly_overpayment: f64,
}

pub struct SimulateOverpayment;

impl Tool for SimulateOverpayment {
    fn name(&self) -> &'static str {
        "simulate_overpayment"
    }

    fn description(&self) -> &'static str {
        "Work out how much a regular monthly overpayment saves in interest and time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "principal": {
                    "type": "number",
                    "description": "Outstanding loan amount in GBP"
                },
                "annual_rate": {
                    "type": "number",
                    "description": "Annual interest rate as a percentage"
                },
                "term_years": {
                    "type": "integer",
                    "description": "Remaining term in years"
                },
                "monthly_overpayment": {
                    "type": "number",
                    "description": "Extra amount paid each month in GBP"
                }
            },
            "required": ["principal", "annual_rate", "term_years"]
        })
    }

    fn execute(&self, state: &mut CalculatorState, input: Value) -> Value {
        let args: OverpaymentArgs = match parse_input(input) {
            Ok(args) => args,
            Err(error) => return error,
        };
        let query = OverpaymentQuery {
            principal: args.principal,
            annual_rate_percent: args.annual_rate,
            term_years: args.term_years,
            monthly_overpayment: args.monthly_overpayment,
        };
        match simulate_overpayment(&query) {
            Ok(result) => {
                state.principal = args.principal;
                state.interest_rate = args.annual_rate;
                state.term_years = args.term_years;
                state.monthly_payment = Some(result.base_monthly_payment);
                with_echo(
                    &result,
                    &[
                        ("principal", number(args.principal)),
                        ("annual_rate", number(args.annual_rate)),
                        ("term_years", json!(args.term_years)),
                        ("monthly_overpayment", number(args.monthly_overpayment)),
                    ],
                )
            }
            Err(error) => error_value(error.to_string()),
        }
    }
}

pub struct CompareRemortgage;

impl Tool for CompareRemortgage {
    fn name(&self) -> &'static str {
        "compare_remortgage"
    }

    fn description(&self) -> &'static str {
        "Weigh switching to a new mortgage rate against the fees of remortgaging."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "outstanding_balance": {
                    "type": "number",
                    "description": "Remaining mortgage balance in GBP"
                },
                "current_rate": {
                    "type": "number",
                    "description": "Current annual interest rate as a percentage"
                },
                "new_rate": {
                    "type": "number",
                    "description": "Proposed new annual interest rate as a percentage"
                },
                "remaining_term_years": {
                    "type": "integer",
                    "description": "Years left on the mortgage"
                },
                "deal_years": {
                    "type": "integer",
                    "description": "Length of the new fixed deal in years"
                },
                "arrangement_fee": { "type": "number" },
                "valuation_fee": { "type": "number" },
                "legal_fees": { "type": "number" },
                "early_repayment_charge": { "type": "number" }
            },
            "required": ["outstanding_balance", "current_rate", "new_rate",
                         "remaining_term_years", "deal_years"]
        })
    }

    fn execute(&self, _state: &mut CalculatorState, input: Value) -> Value {
        let query: RemortgageQuery = match parse_input(input) {
            Ok(query) => query,
            Err(error) => return error,
        };
        match compare_remortgage(&query) {
            Ok(result) => with_echo(
                &result,
                &[
                    ("outstanding_balance", number(query.outstanding_balance)),
                    ("current_rate", number(query.current_rate)),
                    ("new_rate", number(query.new_rate)),
                ],
            ),
            Err(error) => error_value(error.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct BuyToLetArgs {
    property_value: f64,
    deposit: f64,
    annual_rate: f64,
    monthly_rent: f64,
    #[serde(default = "default_interest_only")]
    interest_only: bool,
    #[serde(default = "default_btl_term_years")]
    term_years: u32,
}

fn default_interest_only() -> bool {
    true
}

fn default_btl_term_years() -> u32 {
    25
}

pub struct AnalyzeBuyToLet;

impl Tool for AnalyzeBuyToLet {
    fn name(&self) -> &'static str {
        "analyze_buy_to_let"
    }

    fn description(&self) -> &'static str {
        "Size up a buy-to-let purchase: payment, rental yield, lender stress test and up-front costs."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "property_value": {
                    "type": "number",
                    "description": "Property purchase price in GBP"
                },
                "deposit": {
                    "type": "number",
                    "description": "Deposit in GBP, typically 25% of the price"
                },
                "annual_rate": {
                    "type": "number",
                    "description": "Annual interest rate as a percentage"
                },
                "monthly_rent": {
                    "type": "number",
                    "description": "Expected monthly rent in GBP"
                },
                "interest_only": {
                    "type": "boolean",
                    "description": "True for an interest-only mortgage (the default)"
                },
                "term_years": {
                    "type": "integer",
                    "description": "Term in years for a repayment mortgage, e.g. 25"
                }
            },
            "required": ["property_value", "deposit", "annual_rate", "monthly_rent"]
        })
    }

    fn execute(&self, state: &mut CalculatorState, input: Value) -> Value {
        let args: BuyToLetArgs = match parse_input(input) {
            Ok(args) => args,
            Err(error) => return error,
        };
        let query = BuyToLetQuery {
            property_value: args.property_value,
            deposit: args.deposit,
            annual_rate_percent: args.annual_rate,
            monthly_rent: args.monthly_rent,
            interest_only: args.interest_only,
            term_years: args.term_years,
        };
        match analyze_buy_to_let(&query) {
            Ok(result) => {
                state.property_value = Some(args.property_value);
                state.stamp_duty = Some(result.stamp_duty);
                with_echo(
                    &result,
                    &[
                        ("property_value", number(args.property_value)),
                        ("deposit", number(args.deposit)),
                        ("annual_rate", number(args.annual_rate)),
                        ("monthly_rent", number(args.monthly_rent)),
                        ("interest_only", json!(args.interest_only)),
                    ],
                )
            }
            Err(error) => error_value(error.to_string()),
        }
    }
}

/// True when a tool result is the error shape rather than a calculation.
pub fn is_error_result(value: &Value) -> bool {
    value.get("error").is_some()
}
