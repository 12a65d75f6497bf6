//! Unified error types for the domain layer
//!
//! These are programmer-facing failures (bad ids, misconfigured schemas,
//! entities handed to the wrong manager). Field-level business rule
//! violations are not errors in this sense; they are collected as
//! [`crate::AttributeError`] values.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// An entity of one kind was handed to code built for another
    #[error("Entity kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// Schema declaration is inconsistent (duplicate attribute, reserved name)
    #[error("Invalid schema for {kind}: {reason}")]
    InvalidSchema { kind: String, reason: String },

    /// Value could not be converted to the requested type
    #[error("Attribute {attribute} has unexpected type: expected {expected}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
    },
}

impl DomainError {
    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error for a typed attribute accessor
    pub fn type_mismatch(attribute: impl Into<String>, expected: &'static str) -> Self {
        Self::TypeMismatch {
            attribute: attribute.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_error() {
        let err = DomainError::kind_mismatch("user", "article");
        assert_eq!(
            err.to_string(),
            "Entity kind mismatch: expected user, got article"
        );
    }

    #[test]
    fn test_invalid_schema_error() {
        let err = DomainError::invalid_schema("user", "duplicate attribute: name");
        assert!(matches!(err, DomainError::InvalidSchema { .. }));
        assert!(err.to_string().contains("duplicate attribute"));
    }
}
