//! Field-level validation errors shared by every entity.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a record or request was rejected before touching the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field missing or blank after trimming.
    MissingField(&'static str),
    /// Numeric field outside its accepted range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Field present but not in the expected shape.
    InvalidFormat { field: &'static str, value: String },
    /// Field only allowed for another role.
    NotApplicable {
        field: &'static str,
        role: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "field `{field}` must be within {min}..={max}, got {value}"),
            Self::InvalidFormat { field, value } => {
                write!(f, "field `{field}` has an invalid format: `{value}`")
            }
            Self::NotApplicable { field, role } => {
                write!(f, "field `{field}` does not apply to role `{role}`")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

pub(crate) fn require_opt(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    require(field, value.unwrap_or_default())
}

pub(crate) fn require_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require, require_range, ValidationError};

    #[test]
    fn blank_strings_are_missing() {
        assert_eq!(
            require("titulo", "  \t"),
            Err(ValidationError::MissingField("titulo"))
        );
        assert!(require("titulo", "Backend").is_ok());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(require_range("horasTrabajadas", 12.0, 0.0, 12.0).is_ok());
        let err = require_range("horasTrabajadas", 13.0, 0.0, 12.0).unwrap_err();
        assert!(err.to_string().contains("0..=12"));
    }
}
