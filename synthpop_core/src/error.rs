//! Error types for profile compilation and sampling.

use thiserror::Error;

/// Errors raised while building distributions or generating entities.
///
/// Every variant except [`GenerationError::UnmatchedConditional`] and
/// [`GenerationError::Serialization`] is a configuration error: the profile
/// itself is unusable and no entity can be produced from it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    /// `type` discriminator names no known distribution family
    #[error("Unknown distribution type: {0}")]
    UnknownDistributionType(String),

    /// Probability weights do not sum to ~1.0
    #[error("Weights for {label} sum to {sum:.4}, expected a value in [0.99, 1.01]")]
    InvalidWeights { label: String, sum: f64 },

    /// A weighted distribution was declared with nothing to choose from
    #[error("No options to sample from: {0}")]
    EmptyOptions(String),

    /// More unique draws requested than there are options
    #[error("Requested {requested} unique draws but only {available} options exist")]
    TooManyUniqueDraws { requested: usize, available: usize },

    /// A distribution parameter is out of its valid domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The specification document could not be decoded
    #[error("Invalid specification: {0}")]
    InvalidSpec(String),

    /// A numeric field received a non-numeric sample
    #[error("Field '{field}' requires a numeric distribution, got {value}")]
    NonNumericSample { field: String, value: String },

    /// A derived calendar date is outside chrono's range
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Result could not be serialized for hand-off
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No conditional rule matched and no default was declared
    #[error("No conditional rule matched ({rules} rules evaluated) and no default distribution is declared")]
    UnmatchedConditional { rules: usize },
}

impl GenerationError {
    /// Creates an invalid-parameter error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates an empty-options error.
    pub fn empty(what: impl Into<String>) -> Self {
        Self::EmptyOptions(what.into())
    }

    /// Creates a non-numeric-sample error.
    pub fn non_numeric(field: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::NonNumericSample {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Returns true when the error means the profile itself is malformed.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            Self::UnmatchedConditional { .. } | Self::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidSpec(err.to_string())
    }
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(GenerationError::UnknownDistributionType("bogus".into()).is_configuration_error());
        assert!(GenerationError::InvalidWeights { label: "gender".into(), sum: 0.9 }
            .is_configuration_error());
        assert!(!GenerationError::UnmatchedConditional { rules: 2 }.is_configuration_error());
    }

    #[test]
    fn test_weight_error_message() {
        let err = GenerationError::InvalidWeights { label: "gender".into(), sum: 0.9 };
        assert_eq!(
            err.to_string(),
            "Weights for gender sum to 0.9000, expected a value in [0.99, 1.01]"
        );
    }
}
