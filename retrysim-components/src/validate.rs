//! Configuration validation
//!
//! Each config type implements [`Validate`]; the helpers below produce a
//! [`ValidationError`] naming the offending field. Floating point helpers treat
//! NaN as out of range.

use std::fmt::Display;

/// Validation result for component configuration
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A configuration value that cannot be used to build a component
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Field '{field}' must be {constraint}, got {value}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        value: String,
    },
}

impl ValidationError {
    fn violation(field: &str, constraint: impl Into<String>, value: impl Display) -> Self {
        ValidationError::ConstraintViolation {
            field: field.to_string(),
            constraint: constraint.into(),
            value: value.to_string(),
        }
    }
}

/// Checks a configuration before anything is built from it.
pub trait Validate {
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    fn validate(&self) -> ValidationResult<()>;
}

/// `min <= value <= max`
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::violation(field, format!("between {min} and {max}"), value))
    }
}

/// Finite and strictly greater than zero.
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::violation(field, "finite and positive", value))
    }
}

/// Finite and at least zero.
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::violation(field, "finite and non-negative", value))
    }
}

/// At most `max`; NaN is rejected.
pub fn validate_at_most(field: &str, value: f64, max: f64) -> ValidationResult<()> {
    if value <= max {
        Ok(())
    } else {
        Err(ValidationError::violation(field, format!("at most {max}"), value))
    }
}

pub fn validate_non_empty(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: "cannot be empty".to_string(),
        })
    } else {
        Ok(())
    }
}
