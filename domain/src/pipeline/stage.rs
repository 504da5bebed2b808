//! Pipeline stages and their legal transitions.

use serde::{Deserialize, Serialize};

/// A stage of the department decision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Initialized,
    ContextLoaded,
    IntentAnalyzed,
    GoalsSet,
    Planned,
    CoordinationChecked,
    ToolsExecuted,
    Observed,
    FeasibilityChecked,
    PolicyValidated,
    Logged,
    ConfidenceEstimated,
    Routed,
    Output,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Initialized => "initialized",
            PipelineStage::ContextLoaded => "context_loaded",
            PipelineStage::IntentAnalyzed => "intent_analyzed",
            PipelineStage::GoalsSet => "goals_set",
            PipelineStage::Planned => "planned",
            PipelineStage::CoordinationChecked => "coordination_checked",
            PipelineStage::ToolsExecuted => "tools_executed",
            PipelineStage::Observed => "observed",
            PipelineStage::FeasibilityChecked => "feasibility_checked",
            PipelineStage::PolicyValidated => "policy_validated",
            PipelineStage::Logged => "logged",
            PipelineStage::ConfidenceEstimated => "confidence_estimated",
            PipelineStage::Routed => "routed",
            PipelineStage::Output => "output",
        }
    }

    /// Human-readable label for progress output.
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::Initialized => "Initializing",
            PipelineStage::ContextLoaded => "Loading context",
            PipelineStage::IntentAnalyzed => "Analyzing intent",
            PipelineStage::GoalsSet => "Setting goal",
            PipelineStage::Planned => "Planning",
            PipelineStage::CoordinationChecked => "Checking for conflicts",
            PipelineStage::ToolsExecuted => "Executing tools",
            PipelineStage::Observed => "Observing",
            PipelineStage::FeasibilityChecked => "Checking feasibility",
            PipelineStage::PolicyValidated => "Validating policy",
            PipelineStage::Logged => "Logging",
            PipelineStage::ConfidenceEstimated => "Estimating confidence",
            PipelineStage::Routed => "Routing",
            PipelineStage::Output => "Done",
        }
    }

    /// Whether the pipeline may move from `self` to `next`.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Initialized, ContextLoaded)
                | (ContextLoaded, IntentAnalyzed)
                | (IntentAnalyzed, GoalsSet)
                | (IntentAnalyzed, Output)
                | (GoalsSet, Planned)
                | (Planned, CoordinationChecked)
                | (Planned, ToolsExecuted)
                | (CoordinationChecked, ToolsExecuted)
                | (CoordinationChecked, FeasibilityChecked)
                | (CoordinationChecked, Output)
                | (ToolsExecuted, Observed)
                | (Observed, FeasibilityChecked)
                | (FeasibilityChecked, CoordinationChecked)
                | (FeasibilityChecked, ToolsExecuted)
                | (FeasibilityChecked, PolicyValidated)
                | (PolicyValidated, Logged)
                | (Logged, ConfidenceEstimated)
                | (ConfidenceEstimated, Routed)
                | (Routed, Output)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Output)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
