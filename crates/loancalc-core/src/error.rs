use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoanCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: String },

    #[error("Degenerate arithmetic result in {context}")]
    ArithmeticDegenerate { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanCalcError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        LoanCalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        LoanCalcError::ArithmeticOverflow {
            context: context.into(),
        }
    }

    pub(crate) fn degenerate(context: impl Into<String>) -> Self {
        LoanCalcError::ArithmeticDegenerate {
            context: context.into(),
        }
    }

    /// Name of the offending field for input and configuration errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            LoanCalcError::InvalidInput { field, .. } | LoanCalcError::InvalidConfig { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LoanCalcError {
    fn from(e: serde_json::Error) -> Self {
        LoanCalcError::SerializationError(e.to_string())
    }
}
