//! Domain error types

use thiserror::Error;

/// Rejections raised before a request ever enters a pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("requester_id must not be empty")]
    EmptyRequester,

    #[error("request kind must not be empty")]
    EmptyKind,

    #[error("location must not be empty")]
    EmptyLocation,

    #[error("estimated cost must be finite and non-negative (got {0})")]
    InvalidCost(f64),

    #[error("unknown department: {0}")]
    UnknownDepartment(String),

    #[error("no pipeline registered for department '{0}'")]
    UnroutableDepartment(String),
}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid coordination transition: {from} -> {to}")]
    InvalidCoordinationTransition { from: String, to: String },

    #[error("Pipeline invariant violated: {0}")]
    Invariant(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
