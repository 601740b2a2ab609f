use thiserror::Error;

/// Errors raised by the generator, metrics engine, evaluator and session.
/// All are recoverable by the caller; none leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TutorError {
    #[error("{field} = {value} is outside [{min}, {max}]")]
    Validation {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} = {value} is not a multiple of {step}")]
    OffGrid { field: String, value: f64, step: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{field} has {actual} entries, expected {expected}")]
    ConfigurationMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

impl TutorError {
    pub fn validation(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        TutorError::Validation {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// True for both out-of-range and off-grid setting values.
    pub fn is_validation(&self) -> bool {
        matches!(self, TutorError::Validation { .. } | TutorError::OffGrid { .. })
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        TutorError::InvalidInput(reason.into())
    }
}

pub type TutorResult<T> = Result<T, TutorError>;
