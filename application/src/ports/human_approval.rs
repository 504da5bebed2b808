//! Human approval port for escalated coordination runs.
//!
//! This module defines the port (interface) for asking a person to settle a
//! coordination run that the automatic resolvers may not decide alone.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`HumanApprovalPort`] - defined here in application layer
//! - **Adapters**: `ChannelHumanApproval` (infrastructure, out-of-band
//!   submission) and `InteractiveHumanApproval` (presentation, stdin)
//!
//! # Flow
//!
//! ```text
//! Resolutions proposed
//!        ↓
//! requires_human OR total cost > auto-approval limit
//!        ↓
//! EscalationRecord persisted
//!        ↓
//! HumanApprovalPort::request_decision()
//!        ↓
//! Verdict arrives ── or ── timeout / cancellation → unresolved escalate
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveEscalations`] - Always approves every proposal
//! - [`AutoRejectEscalations`] - Always rejects
//!
//! The use case bounds the wait with its own timeout, so implementations may
//! block for as long as it takes a person to answer.

use async_trait::async_trait;
use civic_domain::{EscalationRecord, HumanVerdict, ResolutionDecision};
use thiserror::Error;

/// Failures while obtaining a verdict, as opposed to the verdict itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HumanApprovalError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Approver unavailable: {0}")]
    Unavailable(String),
}

/// Port for requesting a human verdict on an escalation.
///
/// # Returns
///
/// * `Ok(verdict)` - the decision the approver made
/// * `Err(HumanApprovalError)` - no decision could be obtained; the caller
///   leaves the run unresolved
#[async_trait]
pub trait HumanApprovalPort: Send + Sync {
    async fn request_decision(
        &self,
        escalation: &EscalationRecord,
    ) -> Result<HumanVerdict, HumanApprovalError>;
}

/// Approves every escalation as proposed.
///
/// # Warning
///
/// **Use with caution!** This removes the human from the loop entirely.
/// Intended for simulations and tests.
pub struct AutoApproveEscalations;

#[async_trait]
impl HumanApprovalPort for AutoApproveEscalations {
    async fn request_decision(
        &self,
        _escalation: &EscalationRecord,
    ) -> Result<HumanVerdict, HumanApprovalError> {
        Ok(HumanVerdict::new(
            ResolutionDecision::ApproveAll,
            "auto-approve",
            "approved automatically",
        ))
    }
}

/// Rejects every escalation. The safest non-interactive mode.
pub struct AutoRejectEscalations;

#[async_trait]
impl HumanApprovalPort for AutoRejectEscalations {
    async fn request_decision(
        &self,
        _escalation: &EscalationRecord,
    ) -> Result<HumanVerdict, HumanApprovalError> {
        Ok(HumanVerdict::new(
            ResolutionDecision::Reject,
            "auto-reject",
            "rejected automatically",
        ))
    }
}
