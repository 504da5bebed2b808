//! The persisted outcome of a pipeline run.

use super::{PipelineState, Plan};
use crate::core::facts::Facts;
use crate::request::{Department, Request};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Verdict of a department pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalDecision {
    Approve,
    Escalate,
    Reject,
}

impl FinalDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalDecision::Approve => "approve",
            FinalDecision::Escalate => "escalate",
            FinalDecision::Reject => "reject",
        }
    }
}

impl std::fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a recorded decision.
///
/// Only `approved` and `in_progress` decisions are visible to conflict
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    InProgress,
    PendingReview,
    Rejected,
    Completed,
}

impl DecisionStatus {
    /// Statuses that still hold resources at a location.
    pub const ACTIVE: [DecisionStatus; 2] = [DecisionStatus::Approved, DecisionStatus::InProgress];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Approved => "approved",
            DecisionStatus::InProgress => "in_progress",
            DecisionStatus::PendingReview => "pending_review",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Completed => "completed",
        }
    }
}

impl From<FinalDecision> for DecisionStatus {
    fn from(decision: FinalDecision) -> Self {
        match decision {
            FinalDecision::Approve => DecisionStatus::Approved,
            FinalDecision::Escalate => DecisionStatus::PendingReview,
            FinalDecision::Reject => DecisionStatus::Rejected,
        }
    }
}

/// One row per terminal pipeline run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: Uuid,
    pub department: Department,
    pub request_snapshot: Request,
    #[serde(default)]
    pub context_snapshot: Facts,
    #[serde(default)]
    pub plan_snapshot: Option<Plan>,
    pub feasible: bool,
    pub policy_compliant: bool,
    /// Whether policy checks ran at all. An early escalation skips them.
    #[serde(default)]
    pub policy_evaluated: bool,
    pub confidence: f64,
    #[serde(default)]
    pub confidence_factors: BTreeMap<String, f64>,
    pub final_decision: FinalDecision,
    pub status: DecisionStatus,
    pub reasoning: String,
    #[serde(default)]
    pub escalation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl Decision {
    /// Snapshot a finished pipeline state.
    ///
    /// A state without a final decision is recorded as an escalation.
    pub fn from_state(state: &PipelineState, execution_time_ms: u64) -> Self {
        let final_decision = state.final_decision.unwrap_or(FinalDecision::Escalate);
        Self {
            decision_id: Uuid::new_v4(),
            department: state.request.department,
            request_snapshot: state.request.clone(),
            context_snapshot: state.context.clone(),
            plan_snapshot: state.plan.clone(),
            feasible: state.feasible,
            policy_compliant: state.policy_ok,
            policy_evaluated: state.policy_evaluated,
            confidence: state.confidence.unwrap_or(0.0),
            confidence_factors: state.confidence_factors.clone(),
            final_decision,
            status: final_decision.into(),
            reasoning: state.reasoning.clone(),
            escalation_reason: state.escalation_reason.clone(),
            created_at: Utc::now(),
            execution_time_ms,
        }
    }

    /// Override the lifecycle status (used when seeding work already under way).
    pub fn with_status(mut self, status: DecisionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Location the decision commits to: the plan's, else the request's.
    pub fn location(&self) -> &str {
        self.plan_snapshot
            .as_ref()
            .map(|p| p.location.as_str())
            .unwrap_or(&self.request_snapshot.location)
    }
}
