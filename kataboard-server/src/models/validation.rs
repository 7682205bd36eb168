//! Validation error types

use std::fmt;

/// Raised when request input cannot be coerced into a domain value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Millisecond timestamp outside the representable range
    TimestampOutOfRange { field: &'static str, value: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampOutOfRange { field, value } => {
                write!(f, "{} is not a valid millisecond timestamp: {}", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TimestampOutOfRange {
            field: "timestamp",
            value: i64::MAX,
        };
        assert_eq!(
            err.to_string(),
            format!("timestamp is not a valid millisecond timestamp: {}", i64::MAX)
        );
    }
}
