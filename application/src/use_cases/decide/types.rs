//! Type definitions for the Decide use case.

use civic_domain::{Decision, Department, PipelineState, ValidationError};
use thiserror::Error;

/// Errors that stop a request before a decision can be recorded.
///
/// Infeasible plans and policy violations are outcomes, not errors: they
/// come back as an escalate or reject [`Decision`].
#[derive(Error, Debug)]
pub enum DecideError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("No pipeline registered for department {0}")]
    UnknownDepartment(Department),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DecideError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecideError::Cancelled)
    }
}

/// Output from the Decide use case
#[derive(Debug, Clone)]
pub struct DecideOutput {
    /// The recorded decision
    pub decision: Decision,
    /// Final pipeline state, kept for display and debugging
    pub state: PipelineState,
}
