//! Deterministic UK mortgage and property-tax calculations.
//!
//! Everything in this crate is a pure function of its inputs: the engine
//! performs no I/O, holds no hidden state, and reports every validation
//! failure as data so the conversational layer can relay it verbatim.
//! Session state (`CalculatorState`) is an explicit record owned by the
//! caller; the engine never mutates ambient globals.

pub mod config;
pub mod engine;
pub mod errors;
pub mod session;

pub use engine::affordability::{estimate_affordability, AffordabilityQuery, AffordabilityResult};
pub use engine::buy_to_let::{analyze_buy_to_let, BuyToLetQuery, BuyToLetResult};
pub use engine::comparison::{compare_scenarios, ComparisonResult, ScenarioInput, ScenarioResult};
pub use engine::money::{format_gbp, round_currency};
pub use engine::overpayment::{simulate_overpayment, OverpaymentQuery, OverpaymentResult};
pub use engine::remortgage::{compare_remortgage, RemortgageQuery, RemortgageResult};
pub use engine::repayment::{compute_repayment, LoanTerms, RepaymentResult};
pub use engine::stamp_duty::{compute_stamp_duty, BandBreakdown, StampDutyQuery, StampDutyResult};
pub use errors::CalcError;
pub use session::CalculatorState;
