//! Error types for port operations.

/// Persistence errors with context for debugging.
///
/// Every variant is a fatal failure from the pipeline's point of view: the
/// manager rolls back and propagates it instead of collecting it.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity kind and ID for actionable error messages.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Storage operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// Transaction boundary misuse or failure (begin/commit/rollback).
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl RepoError {
    /// Create a NotFound error with entity kind and ID context.
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Transaction error.
    pub fn transaction(message: impl ToString) -> Self {
        Self::Transaction(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_context() {
        let err = RepoError::not_found("user", "abc123");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "user not found: abc123");
    }

    #[test]
    fn database_error_names_the_operation() {
        let err = RepoError::database("save", "disk full");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Database error in save: disk full");
    }
}
