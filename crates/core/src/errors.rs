use thiserror::Error;

/// Engine failures are returned as data, never raised as panics: the
/// dispatch layer serializes the message into an `{"error": ...}` object
/// and relays it conversationally. Every operation is deterministic, so a
/// retry with the same input reproduces the same error.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CalcError {
    /// A numeric precondition was violated. `field` names the offending
    /// input; `message` is the user-facing sentence.
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },
    /// A comparison was requested with fewer than two scenarios.
    #[error("Please provide at least 2 scenarios to compare")]
    InsufficientScenarios { provided: usize },
}

impl CalcError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput { field, message: message.into() }
    }

    /// The input field the error refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidInput { field, .. } => Some(field),
            Self::InsufficientScenarios { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CalcError;

    #[test]
    fn invalid_input_display_is_the_user_facing_message() {
        let error = CalcError::invalid("principal", "Principal must be positive");
        assert_eq!(error.to_string(), "Principal must be positive");
        assert_eq!(error.field(), Some("principal"));
    }

    #[test]
    fn insufficient_scenarios_names_no_field() {
        let error = CalcError::InsufficientScenarios { provided: 1 };
        assert_eq!(error.field(), None);
        assert!(error.to_string().contains("at least 2 scenarios"));
    }
}
