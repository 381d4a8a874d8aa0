//! Error types for the SQL guard.
//!
//! Errors never escape [`SqlGuard::validate`](crate::SqlGuard::validate): the
//! orchestrator folds them into a BLOCKED violation. They do surface from
//! engine construction and configuration loading.

use crate::security::ViolationType;
use thiserror::Error;

/// Domain-specific errors for the SQL guard.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The statement could not be tokenized
    #[error("SQL parse error: {0}")]
    Parse(String),

    /// The supplied schema catalog is malformed
    #[error("Invalid schema catalog: {0}")]
    Schema(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuardError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Violation type this error is reported as when validation fails closed.
    pub fn violation_type(&self) -> ViolationType {
        match self {
            Self::Parse(_) | Self::InvalidInput(_) => ViolationType::ParseError,
            Self::Config(_) | Self::Schema(_) | Self::Internal(_) => {
                ViolationType::ValidationError
            }
        }
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some("Check the SQLGUARD_* environment variables and pattern syntax"),
            Self::Parse(_) => Some("Check for unterminated strings or quoted identifiers"),
            Self::Schema(_) => Some("Refresh the table catalog and retry with the new snapshot"),
            Self::InvalidInput(_) => Some("Provide a single, non-empty SQL statement"),
            Self::Internal(_) => None,
        }
    }
}
