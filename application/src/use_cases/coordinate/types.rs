//! Type definitions for the Coordinate use case.

use civic_domain::{CoordinationRecord, CoordinationState, DomainError, ResolutionDecision};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinateError {
    #[error("Coordination invariant violated: {0}")]
    Domain(#[from] DomainError),
}

/// Output from the Coordinate use case
#[derive(Debug, Clone)]
pub struct CoordinationResult {
    /// Full working state, workflow log included
    pub state: CoordinationState,
    /// The persisted summary row
    pub record: CoordinationRecord,
}

impl CoordinationResult {
    pub fn final_decision(&self) -> ResolutionDecision {
        self.record.final_decision
    }

    pub fn requires_human(&self) -> bool {
        self.state.requires_human
    }

    /// The human gate fired but no verdict arrived.
    pub fn is_unresolved(&self) -> bool {
        self.record.unresolved
    }
}

/// How the wait for a human verdict ended.
#[derive(Debug)]
pub(super) enum HumanWait {
    Verdict(civic_domain::HumanVerdict),
    TimedOut,
    Cancelled,
    Failed(String),
    NoApprover,
}
