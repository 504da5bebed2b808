//! Coordination run state and its audit records.

use super::candidate::AgentDecision;
use super::conflict::Conflict;
use super::resolution::{ExecutionPlan, Resolution, ResolutionDecision, ResolutionMethod};
use crate::core::error::DomainError;
use crate::request::Department;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStage {
    DetectConflicts,
    AssessComplexity,
    ResolveWithRules,
    ResolveWithLlm,
    CheckHumanApproval,
    EscalateHuman,
    Finalize,
}

impl CoordinationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinationStage::DetectConflicts => "detect_conflicts",
            CoordinationStage::AssessComplexity => "assess_complexity",
            CoordinationStage::ResolveWithRules => "resolve_with_rules",
            CoordinationStage::ResolveWithLlm => "resolve_with_llm",
            CoordinationStage::CheckHumanApproval => "check_human_approval",
            CoordinationStage::EscalateHuman => "escalate_human",
            CoordinationStage::Finalize => "finalize",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CoordinationStage::DetectConflicts => "Detecting conflicts",
            CoordinationStage::AssessComplexity => "Assessing complexity",
            CoordinationStage::ResolveWithRules => "Resolving with rules",
            CoordinationStage::ResolveWithLlm => "Negotiating",
            CoordinationStage::CheckHumanApproval => "Checking approval gate",
            CoordinationStage::EscalateHuman => "Awaiting human decision",
            CoordinationStage::Finalize => "Finalizing",
        }
    }

    pub fn can_transition_to(&self, next: CoordinationStage) -> bool {
        use CoordinationStage::*;
        matches!(
            (self, next),
            (DetectConflicts, AssessComplexity)
                | (AssessComplexity, Finalize)
                | (AssessComplexity, ResolveWithRules)
                | (AssessComplexity, ResolveWithLlm)
                | (ResolveWithRules, CheckHumanApproval)
                | (ResolveWithLlm, CheckHumanApproval)
                | (CheckHumanApproval, EscalateHuman)
                | (CheckHumanApproval, Finalize)
                | (EscalateHuman, Finalize)
        )
    }
}

impl std::fmt::Display for CoordinationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the append-only coordination trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub stage: CoordinationStage,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// A human approver's ruling on an escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanVerdict {
    pub decision: ResolutionDecision,
    pub rationale: String,
    pub approver: String,
    #[serde(default)]
    pub execution_plan: Option<ExecutionPlan>,
    pub decided_at: DateTime<Utc>,
}

impl HumanVerdict {
    pub fn new(
        decision: ResolutionDecision,
        approver: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            decision,
            rationale: rationale.into(),
            approver: approver.into(),
            execution_plan: None,
            decided_at: Utc::now(),
        }
    }

    pub fn with_execution_plan(mut self, plan: ExecutionPlan) -> Self {
        self.execution_plan = Some(plan);
        self
    }
}

/// A pending request for human judgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub escalation_id: Uuid,
    pub coordination_id: Uuid,
    pub reason: String,
    pub conflicts: Vec<Conflict>,
    pub proposed_resolutions: Vec<Resolution>,
    pub total_cost: f64,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

impl EscalationRecord {
    pub fn new(state: &CoordinationState, reason: impl Into<String>, timeout: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            escalation_id: Uuid::new_v4(),
            coordination_id: state.coordination_id,
            reason: reason.into(),
            conflicts: state.conflicts_detected.clone(),
            proposed_resolutions: state.resolutions.clone(),
            total_cost: state.total_cost(),
            created_at,
            deadline: created_at + timeout,
        }
    }
}

/// Working state of one coordination run.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinationState {
    pub coordination_id: Uuid,
    pub stage: CoordinationStage,
    pub agent_decisions: Vec<AgentDecision>,
    pub conflicts_detected: Vec<Conflict>,
    pub resolution_method: Option<ResolutionMethod>,
    pub resolutions: Vec<Resolution>,
    pub requires_human: bool,
    pub escalation: Option<EscalationRecord>,
    pub human_verdict: Option<HumanVerdict>,
    pub final_decision: Option<ResolutionDecision>,
    pub execution_plan: ExecutionPlan,
    /// The human gate fired but no verdict arrived.
    pub unresolved: bool,
    pub workflow_log: Vec<WorkflowEntry>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CoordinationState {
    pub fn new(agent_decisions: Vec<AgentDecision>) -> Self {
        let started_at = Utc::now();
        Self {
            coordination_id: Uuid::new_v4(),
            stage: CoordinationStage::DetectConflicts,
            agent_decisions,
            conflicts_detected: Vec::new(),
            resolution_method: None,
            resolutions: Vec::new(),
            requires_human: false,
            escalation: None,
            human_verdict: None,
            final_decision: None,
            execution_plan: ExecutionPlan::default(),
            unresolved: false,
            workflow_log: vec![WorkflowEntry {
                stage: CoordinationStage::DetectConflicts,
                message: "coordination started".to_string(),
                at: started_at,
            }],
            started_at,
            completed_at: None,
        }
    }

    pub fn advance(&mut self, next: CoordinationStage) -> Result<(), DomainError> {
        if !self.stage.can_transition_to(next) {
            return Err(DomainError::InvalidCoordinationTransition {
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Append to the workflow log. Entries are never removed.
    pub fn log(&mut self, message: impl Into<String>) {
        self.workflow_log.push(WorkflowEntry {
            stage: self.stage,
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn total_cost(&self) -> f64 {
        self.agent_decisions.iter().map(|d| d.estimated_cost).sum()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.agent_decisions
            .iter()
            .map(|d| d.department)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// The persisted outcome of a coordination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationRecord {
    pub coordination_id: Uuid,
    pub departments: Vec<Department>,
    pub decision_ids: Vec<Uuid>,
    pub conflict_ids: Vec<Uuid>,
    pub resolution_ids: Vec<Uuid>,
    pub method: Option<ResolutionMethod>,
    pub final_decision: ResolutionDecision,
    pub execution_plan: ExecutionPlan,
    #[serde(default)]
    pub escalation_id: Option<Uuid>,
    #[serde(default)]
    pub human_verdict: Option<HumanVerdict>,
    pub unresolved: bool,
    pub created_at: DateTime<Utc>,
}

impl CoordinationRecord {
    pub fn from_state(state: &CoordinationState) -> Self {
        Self {
            coordination_id: state.coordination_id,
            departments: state.departments(),
            decision_ids: state.agent_decisions.iter().map(|d| d.decision_id).collect(),
            conflict_ids: state.conflicts_detected.iter().map(|c| c.conflict_id).collect(),
            resolution_ids: state.resolutions.iter().map(|r| r.resolution_id).collect(),
            method: state.resolution_method,
            final_decision: state
                .final_decision
                .unwrap_or(ResolutionDecision::Escalate),
            execution_plan: state.execution_plan.clone(),
            escalation_id: state.escalation.as_ref().map(|e| e.escalation_id),
            human_verdict: state.human_verdict.clone(),
            unresolved: state.unresolved,
            created_at: state.completed_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = CoordinationState::new(Vec::new());
        assert!(state.advance(CoordinationStage::AssessComplexity).is_ok());
        assert!(state.advance(CoordinationStage::EscalateHuman).is_err());
        assert!(state.advance(CoordinationStage::ResolveWithLlm).is_ok());
        assert!(state.advance(CoordinationStage::CheckHumanApproval).is_ok());
        assert!(state.advance(CoordinationStage::EscalateHuman).is_ok());
        assert!(state.advance(CoordinationStage::Finalize).is_ok());
    }

    #[test]
    fn test_workflow_log_appends_with_stage() {
        let mut state = CoordinationState::new(Vec::new());
        state.log("0 conflicts detected");
        state.advance(CoordinationStage::AssessComplexity).unwrap();
        state.log("no conflicts");
        assert_eq!(state.workflow_log.len(), 3);
        assert_eq!(state.workflow_log[2].stage, CoordinationStage::AssessComplexity);
    }

    #[test]
    fn test_escalation_deadline() {
        let state = CoordinationState::new(Vec::new());
        let record = EscalationRecord::new(&state, "cost", Duration::hours(24));
        assert_eq!(record.deadline - record.created_at, Duration::hours(24));
        assert_eq!(record.coordination_id, state.coordination_id);
    }

    #[test]
    fn test_record_defaults_to_escalate() {
        let state = CoordinationState::new(Vec::new());
        let record = CoordinationRecord::from_state(&state);
        assert_eq!(record.final_decision, ResolutionDecision::Escalate);
        assert!(!record.unresolved);
    }
}
