use serde::{Deserialize, Serialize};

use crate::engine::comparison::{DEFAULT_ANNUAL_RATE, DEFAULT_PRINCIPAL, DEFAULT_TERM_YEARS};

/// Per-session scratchpad shared between the assistant and its caller.
///
/// Each tool invocation overwrites the fields it touches wholesale; nothing
/// here is persisted. The engine itself never reads or writes this record,
/// only the tool layer does.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorState {
    pub principal: f64,
    pub interest_rate: f64,
    pub term_years: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_interest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_duty: Option<f64>,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            principal: DEFAULT_PRINCIPAL,
            interest_rate: DEFAULT_ANNUAL_RATE,
            term_years: DEFAULT_TERM_YEARS,
            monthly_payment: None,
            total_interest: None,
            property_value: None,
            stamp_duty: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CalculatorState;

    #[test]
    fn fresh_state_carries_the_default_loan() {
        let state = CalculatorState::default();
        assert_eq!(state.principal, 300_000.0);
        assert_eq!(state.interest_rate, 4.5);
        assert_eq!(state.term_years, 25);
        assert_eq!(state.monthly_payment, None);
        assert_eq!(state.stamp_duty, None);
    }

    #[test]
    fn unset_results_are_omitted_from_the_wire() {
        let state = CalculatorState::default();
        let json = serde_json::to_value(state).expect("serializable");
        let object = json.as_object().expect("object");
        assert!(object.contains_key("principal"));
        assert!(!object.contains_key("monthly_payment"));
        assert!(!object.contains_key("property_value"));
    }
}
