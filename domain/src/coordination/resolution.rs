//! Conflict resolutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a resolution was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    Rule,
    Llm,
    Human,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Rule => "rule",
            ResolutionMethod::Llm => "llm",
            ResolutionMethod::Human => "human",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome a resolution prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionDecision {
    ApproveAll,
    ApprovePartial,
    Defer,
    Escalate,
    Reject,
}

impl ResolutionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionDecision::ApproveAll => "approve_all",
            ResolutionDecision::ApprovePartial => "approve_partial",
            ResolutionDecision::Defer => "defer",
            ResolutionDecision::Escalate => "escalate",
            ResolutionDecision::Reject => "reject",
        }
    }

    pub const ALL: [ResolutionDecision; 5] = [
        ResolutionDecision::ApproveAll,
        ResolutionDecision::ApprovePartial,
        ResolutionDecision::Defer,
        ResolutionDecision::Escalate,
        ResolutionDecision::Reject,
    ];
}

impl std::fmt::Display for ResolutionDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResolutionDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        ResolutionDecision::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Unknown resolution: {}. Valid: approve_all, approve_partial, defer, escalate, reject",
                    s
                )
            })
    }
}

/// Which departments go ahead now and which wait.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    #[serde(default)]
    pub approved: Vec<String>,
    #[serde(default)]
    pub deferred: Vec<String>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.approved.is_empty() && self.deferred.is_empty()
    }
}

/// How one conflict was settled. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolution_id: Uuid,
    pub conflict_id: Uuid,
    pub method: ResolutionMethod,
    pub decision: ResolutionDecision,
    pub rationale: String,
    pub confidence: f64,
    pub requires_human: bool,
    #[serde(default)]
    pub execution_plan: ExecutionPlan,
    pub resolved_at: DateTime<Utc>,
}

impl Resolution {
    pub fn new(
        conflict_id: Uuid,
        method: ResolutionMethod,
        decision: ResolutionDecision,
        rationale: impl Into<String>,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            resolution_id: Uuid::new_v4(),
            conflict_id,
            method,
            decision,
            rationale: rationale.into(),
            confidence: 0.0,
            requires_human: false,
            execution_plan: ExecutionPlan::default(),
            resolved_at,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_requires_human(mut self, requires_human: bool) -> Self {
        self.requires_human = requires_human;
        self
    }

    pub fn with_execution_plan(mut self, plan: ExecutionPlan) -> Self {
        self.execution_plan = plan;
        self
    }

    /// The safe outcome when negotiation cannot produce a usable answer:
    /// escalate with zero confidence and a human in the loop.
    pub fn fallback(conflict_id: Uuid, rationale: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(
            conflict_id,
            ResolutionMethod::Llm,
            ResolutionDecision::Escalate,
            rationale,
            at,
        )
        .with_confidence(0.0)
        .with_requires_human(true)
    }

    /// Fallback for oracle transport failures and timeouts.
    pub fn negotiation_failed(conflict_id: Uuid, at: DateTime<Utc>) -> Self {
        Self::fallback(conflict_id, "negotiation failed", at)
    }
}
